//! In-memory storage double shared by the unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use crate::error::UploadError;
use crate::storage::{RemoteStorage, StorageFuture, UploadBody, UploadMetadata};
use crate::types::{RemoteFileEntry, SessionContext, UploadEvent, UploadReceipt, UploadTicket};

pub(crate) fn test_session() -> SessionContext {
    SessionContext {
        api_url: "https://api.test".into(),
        auth_token: "auth-token".into(),
        bucket_id: "bucket-1".into(),
        bucket_name: "test-bucket".into(),
    }
}

/// Collects the events currently queued on `rx`.
pub(crate) fn drain_events(rx: &mut mpsc::Receiver<UploadEvent>) -> Vec<UploadEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A body received by the mock.
#[derive(Debug, Clone)]
pub(crate) struct RecordedUpload {
    pub remote_name: String,
    pub content_type: String,
    pub content_sha1: String,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub(crate) struct MockStorage {
    remote: Mutex<BTreeMap<String, u64>>,
    uploads: Mutex<Vec<RecordedUpload>>,
    upload_failures: Mutex<HashMap<String, u32>>,
    upload_corruptions: Mutex<HashMap<String, u32>>,
    ticket_failures: AtomicU32,
    listings_fail: AtomicBool,
    list_calls: AtomicUsize,
    ticket_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    upload_delay: Mutex<Option<Duration>>,
    inflight: AtomicUsize,
    max_inflight: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the remote listing.
    pub fn put_remote(&self, name: &str, size_bytes: u64) {
        self.remote.lock().unwrap().insert(name.to_string(), size_bytes);
    }

    pub fn fail_listings(&self) {
        self.listings_fail.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_tickets(&self, count: u32) {
        self.ticket_failures.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` uploads of `name` fail in transport.
    pub fn fail_next_uploads(&self, name: &str, count: u32) {
        self.upload_failures.lock().unwrap().insert(name.to_string(), count);
    }

    /// Makes the next `count` uploads of `name` echo a wrong digest.
    pub fn corrupt_next_uploads(&self, name: &str, count: u32) {
        self.upload_corruptions.lock().unwrap().insert(name.to_string(), count);
    }

    /// Holds every upload open for `delay` so concurrency can be observed.
    pub fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn ticket_calls(&self) -> usize {
        self.ticket_calls.load(Ordering::SeqCst)
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    /// Highest number of uploads observed in flight at once.
    pub fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    /// Successfully received bodies, in arrival order.
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    fn take_one(map: &Mutex<HashMap<String, u32>>, name: &str) -> bool {
        let mut map = map.lock().unwrap();
        match map.get_mut(name) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl RemoteStorage for MockStorage {
    fn list_file_names(
        &self,
        _session: &SessionContext,
        start_file_name: &str,
        max_file_count: u32,
    ) -> StorageFuture<'_, Vec<RemoteFileEntry>> {
        let start = start_file_name.to_string();
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            if self.listings_fail.load(Ordering::SeqCst) {
                return Err(UploadError::RemoteIndex("listing unavailable".into()));
            }
            let remote = self.remote.lock().unwrap();
            Ok(remote
                .range(start..)
                .take(max_file_count as usize)
                .map(|(name, size)| RemoteFileEntry {
                    name: name.clone(),
                    size_bytes: *size,
                })
                .collect())
        })
    }

    fn get_upload_url(&self, _session: &SessionContext) -> StorageFuture<'_, UploadTicket> {
        Box::pin(async move {
            let n = self.ticket_calls.fetch_add(1, Ordering::SeqCst);
            let failing = self
                .ticket_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(UploadError::Ticket("service unavailable".into()));
            }
            Ok(UploadTicket {
                endpoint_url: format!("https://pod.test/upload/{n}"),
                ticket_token: format!("ticket-{n}"),
            })
        })
    }

    fn upload_file(
        &self,
        _ticket: UploadTicket,
        metadata: UploadMetadata,
        body: UploadBody,
    ) -> StorageFuture<'_, UploadReceipt> {
        Box::pin(async move {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_inflight.fetch_max(now, Ordering::SeqCst);

            let delay = *self.upload_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let result = self.receive(metadata, body).await;
            self.inflight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

impl MockStorage {
    async fn receive(
        &self,
        metadata: UploadMetadata,
        mut body: UploadBody,
    ) -> Result<UploadReceipt, UploadError> {
        if Self::take_one(&self.upload_failures, &metadata.remote_name) {
            return Err(UploadError::Transmit("connection reset".into()));
        }

        let mut data = Vec::new();
        body.file.read_to_end(&mut data).await?;
        let mut content_sha1 = b2up_transfer::sha1_hex(&data);

        if Self::take_one(&self.upload_corruptions, &metadata.remote_name) {
            content_sha1 = b2up_transfer::sha1_hex(b"corrupted");
        } else {
            self.remote
                .lock()
                .unwrap()
                .insert(metadata.remote_name.clone(), data.len() as u64);
            self.uploads.lock().unwrap().push(RecordedUpload {
                remote_name: metadata.remote_name,
                content_type: metadata.content_type,
                content_sha1: metadata.content_sha1,
                data: data.clone(),
            });
        }

        Ok(UploadReceipt {
            content_sha1,
            size_bytes: data.len() as u64,
        })
    }
}
