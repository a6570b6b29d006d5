//! Bounded-concurrency upload orchestrator.
//!
//! Distributes a file list across a fixed pool of workers that pull from a
//! shared queue, emits progress events, and supports cancellation. Every
//! input path ends with exactly one [`UploadOutcome`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use b2up_transfer::{normalize_remote_name, remote_name_for};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::UploadError;
use crate::probe::RemoteIndexProbe;
use crate::retry::{RetryingUploadTask, emit};
use crate::storage::RemoteStorage;
use crate::types::{ProbeResult, SessionContext, UploadConfig, UploadEvent, UploadOutcome};

type WorkQueue = Arc<Mutex<mpsc::UnboundedReceiver<(usize, PathBuf)>>>;

/// Uploads a list of files with a bounded number of concurrent workers.
pub struct UploadOrchestrator {
    storage: Arc<dyn RemoteStorage>,
    session: Arc<SessionContext>,
    config: Arc<UploadConfig>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
}

impl UploadOrchestrator {
    /// Creates a new orchestrator bound to one session.
    pub fn new(
        storage: Arc<dyn RemoteStorage>,
        session: SessionContext,
        config: UploadConfig,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            storage,
            session: Arc::new(session),
            config: Arc::new(config),
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Takes the event receiver. Can only be called once.
    ///
    /// Events are dropped rather than awaited when the receiver falls behind.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this run.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads `files`, naming each relative to `root`.
    ///
    /// Per-file failures never stop the others. Outcomes are returned in
    /// input order.
    pub async fn run(&self, root: &Path, files: Vec<PathBuf>) -> Vec<UploadOutcome> {
        if files.is_empty() {
            return Vec::new();
        }

        warn_duplicate_names(root, &files);

        let total = files.len();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        for (index, path) in files.iter().cloned().enumerate() {
            // The receiver is alive in this scope.
            let _ = queue_tx.send((index, path));
        }
        drop(queue_tx);
        let queue: WorkQueue = Arc::new(Mutex::new(queue_rx));

        let workers = self.config.effective_concurrency().min(total);
        info!(
            bucket = %self.session.bucket_name,
            files = total,
            workers,
            "starting upload run"
        );

        let root = Arc::new(root.to_path_buf());
        let mut set = JoinSet::new();
        for id in 0..workers {
            let worker = Worker {
                id,
                storage: Arc::clone(&self.storage),
                session: Arc::clone(&self.session),
                config: Arc::clone(&self.config),
                root: Arc::clone(&root),
                events_tx: self.events_tx.clone(),
                cancel: self.cancel.clone(),
            };
            set.spawn(worker.run(Arc::clone(&queue)));
        }

        let mut slots: Vec<Option<UploadOutcome>> = vec![None; total];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(done) => {
                    for (index, outcome) in done {
                        slots[index] = Some(outcome);
                    }
                }
                Err(e) => error!(error = %e, "upload worker terminated abnormally"),
            }
        }

        // A worker that panicked loses the items it had pulled.
        slots
            .into_iter()
            .zip(files)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| {
                    let remote_name = fallback_name(&root, &path);
                    let err = UploadError::TaskJoin("worker did not report an outcome".into());
                    UploadOutcome::failed(path, remote_name, 0, 0, &err)
                })
            })
            .collect()
    }
}

/// One pool member. Owns shared handles so it can be spawned.
struct Worker {
    id: usize,
    storage: Arc<dyn RemoteStorage>,
    session: Arc<SessionContext>,
    config: Arc<UploadConfig>,
    root: Arc<PathBuf>,
    events_tx: mpsc::Sender<UploadEvent>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self, queue: WorkQueue) -> Vec<(usize, UploadOutcome)> {
        let mut done = Vec::new();
        loop {
            let next = queue.lock().await.recv().await;
            let Some((index, path)) = next else { break };

            let outcome = if self.cancel.is_cancelled() {
                let remote_name = fallback_name(&self.root, &path);
                UploadOutcome::failed(path, remote_name, 0, 0, &UploadError::Cancelled)
            } else {
                self.process(path).await
            };
            done.push((index, outcome));
        }
        debug!(worker = self.id, processed = done.len(), "worker finished");
        done
    }

    async fn process(&self, path: PathBuf) -> UploadOutcome {
        let remote_name = match remote_name_for(&self.root, &path) {
            Ok(name) => name,
            Err(e) => {
                let remote_name = fallback_name(&self.root, &path);
                return self.fail(path, remote_name, 0, 0, e.into());
            }
        };

        let size_bytes = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => return self.fail(path, remote_name, 0, 0, e.into()),
        };

        emit(
            &self.events_tx,
            UploadEvent::Started {
                remote_name: remote_name.clone(),
                size_bytes,
            },
        );

        let probe = RemoteIndexProbe::new(
            self.storage.as_ref(),
            &self.session,
            self.config.probe_page_size,
        );
        match probe.probe(&remote_name, size_bytes).await {
            Ok(ProbeResult::MatchingSize) => {
                info!(remote_name = %remote_name, size_bytes, "already present, skipping");
                emit(
                    &self.events_tx,
                    UploadEvent::Skipped {
                        remote_name: remote_name.clone(),
                    },
                );
                return UploadOutcome::skipped(path, remote_name, size_bytes);
            }
            Ok(ProbeResult::MismatchedSize { remote_size }) => {
                debug!(remote_name = %remote_name, size_bytes, remote_size, "size differs, uploading");
            }
            Ok(ProbeResult::Absent) => {}
            Err(e) => return self.fail(path, remote_name, 0, size_bytes, e),
        }

        let task = RetryingUploadTask::new(
            self.storage.as_ref(),
            &self.session,
            &self.config.content_type,
            &self.config.retry,
            &self.cancel,
            &self.events_tx,
        );
        let report = task.run(&path, &remote_name).await;

        match report.result {
            Ok(receipt) => {
                info!(
                    remote_name = %remote_name,
                    attempts = report.attempts,
                    sha1 = %receipt.content_sha1,
                    "uploaded"
                );
                emit(
                    &self.events_tx,
                    UploadEvent::Uploaded {
                        remote_name: remote_name.clone(),
                        attempts: report.attempts,
                        content_sha1: receipt.content_sha1.clone(),
                    },
                );
                UploadOutcome::uploaded(path, remote_name, report.attempts, receipt)
            }
            Err(e) => self.fail(path, remote_name, report.attempts, size_bytes, e),
        }
    }

    fn fail(
        &self,
        path: PathBuf,
        remote_name: String,
        attempts: u32,
        size_bytes: u64,
        err: UploadError,
    ) -> UploadOutcome {
        error!(remote_name = %remote_name, attempts, error = %err, "upload failed");
        emit(
            &self.events_tx,
            UploadEvent::Failed {
                remote_name: remote_name.clone(),
                error: err.to_string(),
            },
        );
        UploadOutcome::failed(path, remote_name, attempts, size_bytes, &err)
    }
}

/// Best-effort label for a file whose remote name could not be derived.
fn fallback_name(root: &Path, path: &Path) -> String {
    remote_name_for(root, path).unwrap_or_else(|_| normalize_remote_name(&path.to_string_lossy()))
}

fn warn_duplicate_names(root: &Path, files: &[PathBuf]) {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for path in files {
        let Ok(name) = remote_name_for(root, path) else {
            continue;
        };
        if let Some(first) = seen.insert(name.clone(), path) {
            warn!(
                remote_name = %name,
                first = %first.display(),
                second = %path.display(),
                "two files map to the same remote name; the later upload wins"
            );
        }
    }
}
