//! Session bootstrap: account authorization and bucket resolution.

use b2up_client::Client;
use b2up_protocol::messages::Bucket;
use b2up_upload::SessionContext;
use tracing::{debug, info};

/// Failures that abort the run before any file is processed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("account authorization failed: {0}")]
    Auth(#[source] b2up_client::Error),

    #[error("listing buckets failed: {0}")]
    BucketListing(#[source] b2up_client::Error),

    #[error("the account has no buckets")]
    NoBuckets,

    #[error("bucket {0:?} not found in the account")]
    BucketNotFound(String),
}

/// Authorizes the account and resolves the target bucket.
pub async fn establish(
    client: &Client,
    account_id: &str,
    application_key: &str,
    bucket: Option<&str>,
) -> Result<SessionContext, SessionError> {
    let auth = client
        .authorize_account(account_id, application_key)
        .await
        .map_err(SessionError::Auth)?;
    debug!(api_url = %auth.api_url, "account authorized");

    let buckets = client
        .list_buckets(&auth.api_url, &auth.authorization_token, &auth.account_id)
        .await
        .map_err(SessionError::BucketListing)?;

    let chosen = select_bucket(&buckets, bucket)?;
    info!(
        bucket = %chosen.bucket_name,
        bucket_id = %chosen.bucket_id,
        available = buckets.len(),
        "using bucket"
    );

    Ok(SessionContext {
        api_url: auth.api_url,
        auth_token: auth.authorization_token,
        bucket_id: chosen.bucket_id.clone(),
        bucket_name: chosen.bucket_name.clone(),
    })
}

/// Picks the bucket named `wanted`, or the first one listed.
pub fn select_bucket<'a>(buckets: &'a [Bucket], wanted: Option<&str>) -> Result<&'a Bucket, SessionError> {
    match wanted {
        Some(name) => buckets
            .iter()
            .find(|b| b.bucket_name == name)
            .ok_or_else(|| SessionError::BucketNotFound(name.to_string())),
        None => buckets.first().ok_or(SessionError::NoBuckets),
    }
}
