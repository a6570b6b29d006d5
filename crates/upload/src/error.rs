//! Upload error types.

/// Errors produced while uploading a file.
///
/// Every kind except [`UploadError::RemoteIndex`] raised by the probe is
/// contained by the per-file retry loop; none of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] b2up_transfer::TransferError),

    #[error("remote index query failed: {0}")]
    RemoteIndex(String),

    #[error("upload ticket request failed: {0}")]
    Ticket(String),

    #[error("transmit failed: {0}")]
    Transmit(String),

    #[error("integrity mismatch: local sha1 {local}, remote sha1 {remote}")]
    IntegrityMismatch { local: String, remote: String },

    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("cancelled")]
    Cancelled,

    #[error("worker task failed: {0}")]
    TaskJoin(String),
}
