//! Remote storage trait.
//!
//! `RemoteStorage` is implemented by the binary on top of the HTTP client.
//! Keeping it a trait lets the upload logic run against in-memory mocks.

use std::future::Future;
use std::pin::Pin;

use crate::error::UploadError;
use crate::types::{RemoteFileEntry, SessionContext, UploadReceipt, UploadTicket};

/// Boxed future returned by [`RemoteStorage`] methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploadError>> + Send + 'a>>;

/// Metadata sent alongside an upload body.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub remote_name: String,
    /// Lowercase hex SHA-1 of the body.
    pub content_sha1: String,
    pub content_type: String,
}

/// An opened local file and its length.
#[derive(Debug)]
pub struct UploadBody {
    pub file: tokio::fs::File,
    pub size_bytes: u64,
}

/// Abstract connection to the object store.
///
/// Implementations map their transport errors onto the matching
/// [`UploadError`] kind: `RemoteIndex` for listings, `Ticket` for upload
/// URL requests, `Transmit` for uploads.
pub trait RemoteStorage: Send + Sync {
    /// Lists up to `max_file_count` names in the session's bucket, in name
    /// order, starting at `start_file_name`.
    fn list_file_names(
        &self,
        session: &SessionContext,
        start_file_name: &str,
        max_file_count: u32,
    ) -> StorageFuture<'_, Vec<RemoteFileEntry>>;

    /// Requests a fresh single-use upload ticket for the session's bucket.
    fn get_upload_url(&self, session: &SessionContext) -> StorageFuture<'_, UploadTicket>;

    /// Streams `body` to the ticketed endpoint and returns what the remote
    /// reported. The ticket is consumed.
    fn upload_file(
        &self,
        ticket: UploadTicket,
        metadata: UploadMetadata,
        body: UploadBody,
    ) -> StorageFuture<'_, UploadReceipt>;
}
