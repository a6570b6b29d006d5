//! Upload ticket issuance.

use tracing::trace;

use crate::error::UploadError;
use crate::storage::RemoteStorage;
use crate::types::{SessionContext, UploadTicket};

/// Requests single-use upload endpoints for the session's bucket.
pub struct UploadTicketSource<'a> {
    storage: &'a dyn RemoteStorage,
    session: &'a SessionContext,
}

impl<'a> UploadTicketSource<'a> {
    pub fn new(storage: &'a dyn RemoteStorage, session: &'a SessionContext) -> Self {
        Self { storage, session }
    }

    /// Requests a fresh ticket. Called once per upload attempt.
    pub async fn request(&self) -> Result<UploadTicket, UploadError> {
        let ticket = self
            .storage
            .get_upload_url(self.session)
            .await
            .map_err(|e| match e {
                UploadError::Ticket(_) => e,
                other => UploadError::Ticket(other.to_string()),
            })?;
        trace!(endpoint = %ticket.endpoint_url, "upload ticket issued");
        Ok(ticket)
    }
}
