//! Concurrent bulk upload of a directory tree to remote object storage.
//!
//! This crate holds the upload **business logic**. It has no HTTP
//! dependency; the binary provides a [`RemoteStorage`] implementation that
//! bridges to the actual API client.
//!
//! # Pipeline (per file)
//!
//! 1. **Name**: derive the remote name relative to the upload root
//! 2. **Probe**: list remote names starting at that name; skip when an
//!    exact match with the same size exists
//! 3. **Ticket**: request a fresh single-use upload endpoint
//! 4. **Transmit**: hash, stream the body, verify the echoed digest
//! 5. **Retry**: repeat 3-4 with backoff up to the attempt budget
//!
//! [`UploadOrchestrator`] runs this pipeline over a file list with a bounded
//! number of workers.

pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod retry;
pub mod scanner;
pub mod storage;
pub mod ticket;
pub mod transmit;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience.
pub use error::UploadError;
pub use orchestrator::UploadOrchestrator;
pub use probe::RemoteIndexProbe;
pub use retry::{Backoff, RetryPolicy, RetryReport, RetryingUploadTask};
pub use scanner::scan_files_for_upload;
pub use storage::{RemoteStorage, StorageFuture, UploadBody, UploadMetadata};
pub use ticket::UploadTicketSource;
pub use transmit::FileTransmitter;
pub use types::{
    ProbeResult, RemoteFileEntry, RunSummary, SessionContext, UploadConfig, UploadEvent,
    UploadOutcome, UploadReceipt, UploadStatus, UploadTicket,
};
