//! Content hashing and remote-name normalization for uploads.
//!
//! The hasher produces the lowercase hex SHA-1 sent with every upload and
//! compared against the digest the service echoes back. Remote names are
//! derived from local paths relative to the upload root.

mod hash;
mod naming;

pub use hash::{FileDigest, digests_match, file_sha1, file_sha1_blocking, sha1_hex};
pub use naming::{normalize_remote_name, remote_name_for, validate_remote_name};

/// Read buffer used while hashing: 256 KiB.
pub const HASH_BUFFER_SIZE: usize = 256 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid remote name: {0}")]
    InvalidRemoteName(String),

    #[error("{path} is not inside upload root {root}")]
    OutsideRoot { path: String, root: String },
}
