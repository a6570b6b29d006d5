//! Single-attempt file transfer with digest verification.

use std::path::Path;

use b2up_transfer::{digests_match, file_sha1};
use tracing::debug;

use crate::error::UploadError;
use crate::storage::{RemoteStorage, UploadBody, UploadMetadata};
use crate::types::{UploadReceipt, UploadTicket};

/// Streams one local file to a ticketed endpoint.
pub struct FileTransmitter<'a> {
    storage: &'a dyn RemoteStorage,
    content_type: &'a str,
}

impl<'a> FileTransmitter<'a> {
    pub fn new(storage: &'a dyn RemoteStorage, content_type: &'a str) -> Self {
        Self {
            storage,
            content_type,
        }
    }

    /// Uploads `path` as `remote_name` using `ticket`.
    ///
    /// The local SHA-1 is computed before any network call and must equal
    /// the digest the remote echoes back; otherwise the attempt fails with
    /// [`UploadError::IntegrityMismatch`].
    pub async fn transmit(
        &self,
        ticket: UploadTicket,
        path: &Path,
        remote_name: &str,
    ) -> Result<UploadReceipt, UploadError> {
        let digest = file_sha1(path).await?;

        let file = tokio::fs::File::open(path).await?;
        let size_bytes = file.metadata().await?.len();
        if size_bytes != digest.size_bytes {
            return Err(UploadError::Transmit(format!(
                "{} changed while hashing ({} -> {size_bytes} bytes)",
                path.display(),
                digest.size_bytes
            )));
        }

        let metadata = UploadMetadata {
            remote_name: remote_name.to_string(),
            content_sha1: digest.sha1.clone(),
            content_type: self.content_type.to_string(),
        };
        let body = UploadBody { file, size_bytes };

        let receipt = self
            .storage
            .upload_file(ticket, metadata, body)
            .await
            .map_err(|e| match e {
                UploadError::Transmit(_) | UploadError::IntegrityMismatch { .. } => e,
                other => UploadError::Transmit(other.to_string()),
            })?;

        if !digests_match(&digest.sha1, &receipt.content_sha1) {
            return Err(UploadError::IntegrityMismatch {
                local: digest.sha1,
                remote: receipt.content_sha1,
            });
        }

        debug!(remote_name, bytes = size_bytes, sha1 = %digest.sha1, "transfer verified");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockStorage, test_session};
    use crate::ticket::UploadTicketSource;

    #[tokio::test]
    async fn transmit_sends_body_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();

        let storage = MockStorage::new();
        let session = test_session();
        let ticket = UploadTicketSource::new(&storage, &session).request().await.unwrap();

        let transmitter = FileTransmitter::new(&storage, "text/plain");
        let receipt = transmitter.transmit(ticket, &path, "docs/a.txt").await.unwrap();

        assert_eq!(receipt.content_sha1, b2up_transfer::sha1_hex(b"hello"));
        assert_eq!(receipt.size_bytes, 5);

        let uploads = storage.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].remote_name, "docs/a.txt");
        assert_eq!(uploads[0].content_type, "text/plain");
        assert_eq!(uploads[0].content_sha1, b2up_transfer::sha1_hex(b"hello"));
        assert_eq!(uploads[0].data, b"hello");
    }

    #[tokio::test]
    async fn digest_mismatch_fails_the_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();

        let storage = MockStorage::new();
        storage.corrupt_next_uploads("a.txt", 1);
        let session = test_session();
        let ticket = UploadTicketSource::new(&storage, &session).request().await.unwrap();

        let transmitter = FileTransmitter::new(&storage, "b2/x-auto");
        let err = transmitter.transmit(ticket, &path, "a.txt").await.unwrap_err();
        match err {
            UploadError::IntegrityMismatch { local, remote } => {
                assert_eq!(local, b2up_transfer::sha1_hex(b"hello"));
                assert_ne!(local, remote);
            }
            other => panic!("expected integrity mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file_fails_before_any_upload() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MockStorage::new();
        let session = test_session();
        let ticket = UploadTicketSource::new(&storage, &session).request().await.unwrap();

        let transmitter = FileTransmitter::new(&storage, "b2/x-auto");
        let result = transmitter
            .transmit(ticket, &dir.path().join("gone.txt"), "gone.txt")
            .await;
        assert!(result.is_err());
        assert_eq!(storage.upload_calls(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_transmit_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();

        let storage = MockStorage::new();
        storage.fail_next_uploads("a.txt", 1);
        let session = test_session();
        let ticket = UploadTicketSource::new(&storage, &session).request().await.unwrap();

        let transmitter = FileTransmitter::new(&storage, "b2/x-auto");
        let err = transmitter.transmit(ticket, &path, "a.txt").await.unwrap_err();
        assert!(matches!(err, UploadError::Transmit(_)));
    }
}
