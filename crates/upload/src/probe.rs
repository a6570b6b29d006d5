//! Remote existence check.

use b2up_protocol::constants::MAX_LIST_FILE_COUNT;
use tracing::debug;

use crate::error::UploadError;
use crate::storage::RemoteStorage;
use crate::types::{ProbeResult, RemoteFileEntry, SessionContext};

/// Decides whether a file must be uploaded by looking at the remote listing.
pub struct RemoteIndexProbe<'a> {
    storage: &'a dyn RemoteStorage,
    session: &'a SessionContext,
    page_size: u32,
}

impl<'a> RemoteIndexProbe<'a> {
    pub fn new(storage: &'a dyn RemoteStorage, session: &'a SessionContext, page_size: u32) -> Self {
        Self {
            storage,
            session,
            page_size: page_size.clamp(1, MAX_LIST_FILE_COUNT),
        }
    }

    /// Looks up `remote_name` and compares its size with `local_size`.
    ///
    /// Errors are reported as [`UploadError::RemoteIndex`] and are not
    /// retried here.
    pub async fn probe(&self, remote_name: &str, local_size: u64) -> Result<ProbeResult, UploadError> {
        let entries = self
            .storage
            .list_file_names(self.session, remote_name, self.page_size)
            .await
            .map_err(|e| match e {
                UploadError::RemoteIndex(_) => e,
                other => UploadError::RemoteIndex(other.to_string()),
            })?;

        let result = classify(&entries, remote_name, local_size);
        debug!(remote_name, listed = entries.len(), result = ?result, "probe complete");
        Ok(result)
    }
}

/// Scans listing entries for an exact name match.
pub fn classify(entries: &[RemoteFileEntry], remote_name: &str, local_size: u64) -> ProbeResult {
    match entries.iter().find(|e| e.name == remote_name) {
        Some(entry) if entry.size_bytes == local_size => ProbeResult::MatchingSize,
        Some(entry) => ProbeResult::MismatchedSize {
            remote_size: entry.size_bytes,
        },
        None => ProbeResult::Absent,
    }
}
