use std::io::Read;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::{HASH_BUFFER_SIZE, TransferError};

/// SHA-1 digest of a whole file together with the number of bytes hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    /// Lowercase hex SHA-1.
    pub sha1: String,
    /// Bytes read while hashing.
    pub size_bytes: u64,
}

/// Computes SHA-1 of `data` and returns the lowercase hex digest.
pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hashes an entire file on the calling thread.
pub fn file_sha1_blocking(path: &Path) -> Result<FileDigest, TransferError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    let mut size_bytes = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        size_bytes += n as u64;
    }
    Ok(FileDigest {
        sha1: hex::encode(hasher.finalize()),
        size_bytes,
    })
}

/// Hashes an entire file on the blocking pool.
pub async fn file_sha1(path: &Path) -> Result<FileDigest, TransferError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || file_sha1_blocking(&path))
        .await
        .map_err(|e| TransferError::Io(std::io::Error::other(e)))?
}

/// Compares two hex digests, ignoring ASCII case.
pub fn digests_match(local: &str, remote: &str) -> bool {
    !local.is_empty() && local.eq_ignore_ascii_case(remote.trim())
}
