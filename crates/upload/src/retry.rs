//! Per-file retry loop around ticket → transmit → verify.

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::UploadError;
use crate::storage::RemoteStorage;
use crate::ticket::UploadTicketSource;
use crate::transmit::FileTransmitter;
use crate::types::{SessionContext, UploadEvent, UploadReceipt};

/// Default attempt budget per file.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Delay schedule between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same pause after every failed attempt.
    Fixed(Duration),
    /// `initial * factor^(attempt-1)`, capped at `max`.
    Exponential {
        initial: Duration,
        max: Duration,
        factor: f64,
    },
}

/// Attempt budget and backoff for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1).
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Fixed(DEFAULT_RETRY_DELAY),
        }
    }
}

impl RetryPolicy {
    /// Pause after failed attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential {
                initial,
                max,
                factor,
            } => {
                let exp = attempt.saturating_sub(1).min(63) as i32;
                let secs = initial.as_secs_f64() * factor.max(1.0).powi(exp);
                Duration::try_from_secs_f64(secs)
                    .map_or(*max, |delay| delay.min(*max))
            }
        }
    }

    fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Terminal report of a retry loop.
#[derive(Debug)]
pub struct RetryReport {
    /// Attempts started.
    pub attempts: u32,
    /// Verified receipt, or [`UploadError::RetriesExhausted`] /
    /// [`UploadError::Cancelled`].
    pub result: Result<UploadReceipt, UploadError>,
}

enum TaskState {
    Attempting { attempt: u32 },
    Succeeded { attempt: u32, receipt: UploadReceipt },
    Exhausted { attempt: u32, last_error: UploadError },
    Cancelled { attempts: u32 },
}

/// Runs one file's upload with bounded retries.
///
/// Every attempt requests a fresh ticket. Any failure of the ticket request
/// or the transfer, integrity mismatches included, counts as one attempt.
pub struct RetryingUploadTask<'a> {
    tickets: UploadTicketSource<'a>,
    transmitter: FileTransmitter<'a>,
    policy: &'a RetryPolicy,
    cancel: &'a CancellationToken,
    events_tx: &'a mpsc::Sender<UploadEvent>,
}

impl<'a> RetryingUploadTask<'a> {
    pub fn new(
        storage: &'a dyn RemoteStorage,
        session: &'a SessionContext,
        content_type: &'a str,
        policy: &'a RetryPolicy,
        cancel: &'a CancellationToken,
        events_tx: &'a mpsc::Sender<UploadEvent>,
    ) -> Self {
        Self {
            tickets: UploadTicketSource::new(storage, session),
            transmitter: FileTransmitter::new(storage, content_type),
            policy,
            cancel,
            events_tx,
        }
    }

    /// Drives the state machine to a terminal state.
    pub async fn run(&self, path: &Path, remote_name: &str) -> RetryReport {
        let max_attempts = self.policy.attempt_budget();
        let mut state = TaskState::Attempting { attempt: 1 };

        loop {
            state = match state {
                TaskState::Attempting { attempt } if self.cancel.is_cancelled() => {
                    TaskState::Cancelled {
                        attempts: attempt - 1,
                    }
                }
                TaskState::Attempting { attempt } => match self.attempt(path, remote_name).await {
                    Ok(receipt) => TaskState::Succeeded { attempt, receipt },
                    Err(e) if attempt < max_attempts => {
                        let delay = self.policy.delay_for_attempt(attempt);
                        warn!(
                            remote_name,
                            attempt,
                            max_attempts,
                            retry_in = ?delay,
                            error = %e,
                            "upload attempt failed, retrying"
                        );
                        emit(
                            self.events_tx,
                            UploadEvent::AttemptFailed {
                                remote_name: remote_name.to_string(),
                                attempt,
                                error: e.to_string(),
                                retry_in: Some(delay),
                            },
                        );

                        if self.backoff(delay).await {
                            TaskState::Attempting {
                                attempt: attempt + 1,
                            }
                        } else {
                            TaskState::Cancelled { attempts: attempt }
                        }
                    }
                    Err(e) => {
                        emit(
                            self.events_tx,
                            UploadEvent::AttemptFailed {
                                remote_name: remote_name.to_string(),
                                attempt,
                                error: e.to_string(),
                                retry_in: None,
                            },
                        );
                        TaskState::Exhausted {
                            attempt,
                            last_error: e,
                        }
                    }
                },
                TaskState::Succeeded { attempt, receipt } => {
                    return RetryReport {
                        attempts: attempt,
                        result: Ok(receipt),
                    };
                }
                TaskState::Exhausted {
                    attempt,
                    last_error,
                } => {
                    return RetryReport {
                        attempts: attempt,
                        result: Err(UploadError::RetriesExhausted {
                            attempts: attempt,
                            last_error: last_error.to_string(),
                        }),
                    };
                }
                TaskState::Cancelled { attempts } => {
                    return RetryReport {
                        attempts,
                        result: Err(UploadError::Cancelled),
                    };
                }
            };
        }
    }

    /// One attempt: fresh ticket, then transfer and verify.
    async fn attempt(&self, path: &Path, remote_name: &str) -> Result<UploadReceipt, UploadError> {
        let ticket = self.tickets.request().await?;
        self.transmitter.transmit(ticket, path, remote_name).await
    }

    /// Sleeps for `delay`. Returns `false` if cancelled first.
    async fn backoff(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Sends an event without blocking the worker; drops it when the channel is
/// full or closed.
pub(crate) fn emit(events_tx: &mpsc::Sender<UploadEvent>, event: UploadEvent) {
    let _ = events_tx.try_send(event);
}
