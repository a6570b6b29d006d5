//! Data types for the upload flow.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use b2up_protocol::DEFAULT_CONTENT_TYPE;

use crate::retry::RetryPolicy;

/// Default number of concurrent upload workers.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Lowest worker count the orchestrator will run with.
pub const MIN_CONCURRENCY: usize = 2;

/// Number of names requested per existence probe.
pub const DEFAULT_PROBE_PAGE_SIZE: u32 = 10;

/// Immutable session bundle shared read-only by all workers.
#[derive(Clone)]
pub struct SessionContext {
    pub api_url: String,
    pub auth_token: String,
    pub bucket_id: String,
    /// Display name of the target bucket (logging only).
    pub bucket_name: String,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("api_url", &self.api_url)
            .field("auth_token", &"<redacted>")
            .field("bucket_id", &self.bucket_id)
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

/// A name/size pair from a remote listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileEntry {
    pub name: String,
    pub size_bytes: u64,
}

/// Single-use upload endpoint and token.
///
/// Not `Clone`: a ticket is moved into exactly one transmission attempt.
#[derive(Debug)]
pub struct UploadTicket {
    pub endpoint_url: String,
    pub ticket_token: String,
}

/// What the remote reported after accepting an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub content_sha1: String,
    pub size_bytes: u64,
}

/// Answer of the remote existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// No object with exactly this name.
    Absent,
    /// Same name, same size: the upload is skipped.
    MatchingSize,
    /// Same name, different size: uploaded again, the old object is kept.
    MismatchedSize { remote_size: u64 },
}

/// Terminal status of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Skipped,
    Uploaded,
    Failed,
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UploadStatus::Skipped => "skipped",
            UploadStatus::Uploaded => "uploaded",
            UploadStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Final, immutable result for one input path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub path: PathBuf,
    pub remote_name: String,
    pub status: UploadStatus,
    /// Upload attempts made (0 when skipped or failed before uploading).
    pub attempts: u32,
    pub last_error: Option<String>,
    /// Verified remote digest, set on [`UploadStatus::Uploaded`].
    pub content_sha1: Option<String>,
    pub size_bytes: u64,
}

impl UploadOutcome {
    pub(crate) fn skipped(path: PathBuf, remote_name: String, size_bytes: u64) -> Self {
        Self {
            path,
            remote_name,
            status: UploadStatus::Skipped,
            attempts: 0,
            last_error: None,
            content_sha1: None,
            size_bytes,
        }
    }

    pub(crate) fn uploaded(
        path: PathBuf,
        remote_name: String,
        attempts: u32,
        receipt: UploadReceipt,
    ) -> Self {
        Self {
            path,
            remote_name,
            status: UploadStatus::Uploaded,
            attempts,
            last_error: None,
            content_sha1: Some(receipt.content_sha1),
            size_bytes: receipt.size_bytes,
        }
    }

    pub(crate) fn failed(
        path: PathBuf,
        remote_name: String,
        attempts: u32,
        size_bytes: u64,
        error: &crate::UploadError,
    ) -> Self {
        Self {
            path,
            remote_name,
            status: UploadStatus::Failed,
            attempts,
            last_error: Some(error.to_string()),
            content_sha1: None,
            size_bytes,
        }
    }
}

/// Progress event emitted during a run.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// A worker picked up a file.
    Started { remote_name: String, size_bytes: u64 },
    /// The remote already holds a same-size copy.
    Skipped { remote_name: String },
    /// One attempt failed; `retry_in` is `None` when no attempts remain.
    AttemptFailed {
        remote_name: String,
        attempt: u32,
        error: String,
        retry_in: Option<Duration>,
    },
    /// Upload verified.
    Uploaded {
        remote_name: String,
        attempts: u32,
        content_sha1: String,
    },
    /// File reached the failed terminal state.
    Failed { remote_name: String, error: String },
}

/// Settings consumed by the orchestrator.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Requested worker count; raised to [`MIN_CONCURRENCY`] if lower.
    pub concurrency: usize,
    /// Content type sent with every upload.
    pub content_type: String,
    pub retry: RetryPolicy,
    /// `maxFileCount` used by the existence probe.
    pub probe_page_size: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            retry: RetryPolicy::default(),
            probe_page_size: DEFAULT_PROBE_PAGE_SIZE,
        }
    }
}

impl UploadConfig {
    /// Worker count actually used.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(MIN_CONCURRENCY)
    }
}

/// Aggregate counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub uploaded_bytes: u64,
    /// Local paths that remained failed, in input order.
    pub failed_paths: Vec<PathBuf>,
}

impl RunSummary {
    /// Tallies a list of outcomes.
    pub fn from_outcomes(outcomes: &[UploadOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            match outcome.status {
                UploadStatus::Uploaded => {
                    summary.uploaded += 1;
                    summary.uploaded_bytes += outcome.size_bytes;
                }
                UploadStatus::Skipped => summary.skipped += 1,
                UploadStatus::Failed => {
                    summary.failed += 1;
                    summary.failed_paths.push(outcome.path.clone());
                }
            }
        }
        summary
    }

    /// Total number of files considered.
    pub fn total(&self) -> usize {
        self.uploaded + self.skipped + self.failed
    }

    /// Returns `true` when no file ended in the failed state.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} skipped (already present), {} failed",
            self.uploaded, self.skipped, self.failed
        )
    }
}
