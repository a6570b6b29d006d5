//! Adapter bridging `b2up_client::Client` to the `RemoteStorage` trait
//! required by `b2up-upload`.

use b2up_client::{Client, UploadHeaders};
use b2up_protocol::messages::ListFileNamesRequest;
use b2up_upload::{
    RemoteFileEntry, RemoteStorage, SessionContext, StorageFuture, UploadBody, UploadError,
    UploadMetadata, UploadReceipt, UploadTicket,
};

/// Implements `RemoteStorage` over the B2 native API.
pub struct B2Adapter {
    client: Client,
}

impl B2Adapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl RemoteStorage for B2Adapter {
    fn list_file_names(
        &self,
        session: &SessionContext,
        start_file_name: &str,
        max_file_count: u32,
    ) -> StorageFuture<'_, Vec<RemoteFileEntry>> {
        let api_url = session.api_url.clone();
        let token = session.auth_token.clone();
        let req = ListFileNamesRequest {
            bucket_id: session.bucket_id.clone(),
            start_file_name: Some(start_file_name.to_string()),
            max_file_count: Some(max_file_count),
        };
        Box::pin(async move {
            let resp = self
                .client
                .list_file_names(&api_url, &token, &req)
                .await
                .map_err(|e| UploadError::RemoteIndex(e.to_string()))?;
            Ok(resp
                .files
                .into_iter()
                .map(|f| RemoteFileEntry {
                    name: f.file_name,
                    size_bytes: f.size,
                })
                .collect())
        })
    }

    fn get_upload_url(&self, session: &SessionContext) -> StorageFuture<'_, UploadTicket> {
        let api_url = session.api_url.clone();
        let token = session.auth_token.clone();
        let bucket_id = session.bucket_id.clone();
        Box::pin(async move {
            let resp = self
                .client
                .get_upload_url(&api_url, &token, &bucket_id)
                .await
                .map_err(|e| UploadError::Ticket(e.to_string()))?;
            Ok(UploadTicket {
                endpoint_url: resp.upload_url,
                ticket_token: resp.authorization_token,
            })
        })
    }

    fn upload_file(
        &self,
        ticket: UploadTicket,
        metadata: UploadMetadata,
        body: UploadBody,
    ) -> StorageFuture<'_, UploadReceipt> {
        Box::pin(async move {
            let headers = UploadHeaders {
                file_name: &metadata.remote_name,
                content_sha1: &metadata.content_sha1,
                content_type: &metadata.content_type,
                content_length: body.size_bytes,
            };
            let resp = self
                .client
                .upload_file(&ticket.endpoint_url, &ticket.ticket_token, &headers, body.file)
                .await
                .map_err(|e| UploadError::Transmit(e.to_string()))?;
            Ok(UploadReceipt {
                content_sha1: resp.content_sha1,
                size_bytes: resp.content_length,
            })
        })
    }
}
