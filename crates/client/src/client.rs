//! B2 API client.
//!
//! Async HTTP client using `reqwest`. Account authorization uses Basic
//! auth; every other call carries the session or upload token in the
//! `Authorization` header.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use b2up_protocol::constants::{
    AUTHORIZE_ACCOUNT_PATH, DEFAULT_AUTH_URL, GET_UPLOAD_URL_PATH, HEADER_CONTENT_SHA1,
    HEADER_FILE_NAME, LIST_BUCKETS_PATH, LIST_FILE_NAMES_PATH,
};
use b2up_protocol::messages::{
    ApiErrorBody, AuthorizeAccountResponse, Bucket, GetUploadUrlRequest, GetUploadUrlResponse,
    ListBucketsRequest, ListBucketsResponse, ListFileNamesRequest, ListFileNamesResponse,
    UploadFileResponse,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Unreserved characters plus `/` stay literal in `X-Bz-File-Name`.
const FILE_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Errors from the B2 client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
}

impl Error {
    /// Returns `true` for responses that reject the credentials or token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api { status: 401, .. })
    }
}

/// Slowest sustained upload rate that still completes before the deadline.
pub const MIN_UPLOAD_BYTES_PER_SEC: u64 = 32 * 1024;

/// Transport settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Deadline for each JSON call. Uploads get this plus time for the body
    /// at [`MIN_UPLOAD_BYTES_PER_SEC`].
    pub timeout: Duration,
    /// Deadline for establishing a connection.
    pub connect_timeout: Duration,
    /// Base URL for `b2_authorize_account`.
    pub auth_url: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            auth_url: DEFAULT_AUTH_URL.to_string(),
        }
    }
}

/// Metadata headers sent with an upload.
#[derive(Debug, Clone)]
pub struct UploadHeaders<'a> {
    pub file_name: &'a str,
    pub content_sha1: &'a str,
    pub content_type: &'a str,
    pub content_length: u64,
}

/// B2 API client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    auth_url: String,
    timeout: Duration,
}

impl Client {
    /// Creates a new client.
    pub fn new(options: ClientOptions) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .user_agent(concat!("b2up/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            auth_url: options.auth_url.trim_end_matches('/').to_string(),
            timeout: options.timeout,
        })
    }

    /// Exchanges account credentials for a session token and API URL.
    pub async fn authorize_account(
        &self,
        account_id: &str,
        application_key: &str,
    ) -> Result<AuthorizeAccountResponse, Error> {
        let url = format!("{}{AUTHORIZE_ACCOUNT_PATH}", self.auth_url);
        let credentials = STANDARD.encode(format!("{account_id}:{application_key}"));
        let header = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|_| Error::InvalidHeader("Authorization"))?;

        debug!(url = %url, "authorizing account");
        let resp = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .header(AUTHORIZATION, header)
            .send()
            .await?;
        read_json(resp).await
    }

    /// Lists the buckets of an account.
    pub async fn list_buckets(
        &self,
        api_url: &str,
        auth_token: &str,
        account_id: &str,
    ) -> Result<Vec<Bucket>, Error> {
        let req = ListBucketsRequest {
            account_id: account_id.to_string(),
        };
        let resp: ListBucketsResponse = self
            .post_json(&api_endpoint(api_url, LIST_BUCKETS_PATH), auth_token, &req)
            .await?;
        Ok(resp.buckets)
    }

    /// Lists file names in a bucket, starting at `req.start_file_name`.
    pub async fn list_file_names(
        &self,
        api_url: &str,
        auth_token: &str,
        req: &ListFileNamesRequest,
    ) -> Result<ListFileNamesResponse, Error> {
        self.post_json(&api_endpoint(api_url, LIST_FILE_NAMES_PATH), auth_token, req)
            .await
    }

    /// Requests a single-use upload URL and token for a bucket.
    pub async fn get_upload_url(
        &self,
        api_url: &str,
        auth_token: &str,
        bucket_id: &str,
    ) -> Result<GetUploadUrlResponse, Error> {
        let req = GetUploadUrlRequest {
            bucket_id: bucket_id.to_string(),
        };
        self.post_json(&api_endpoint(api_url, GET_UPLOAD_URL_PATH), auth_token, &req)
            .await
    }

    /// Uploads one file body to an upload URL in a single request.
    pub async fn upload_file(
        &self,
        upload_url: &str,
        upload_token: &str,
        headers: &UploadHeaders<'_>,
        body: impl Into<reqwest::Body>,
    ) -> Result<UploadFileResponse, Error> {
        let token = HeaderValue::from_str(upload_token)
            .map_err(|_| Error::InvalidHeader("Authorization"))?;
        let file_name = HeaderValue::from_str(&encode_file_name(headers.file_name))
            .map_err(|_| Error::InvalidHeader(HEADER_FILE_NAME))?;
        let sha1 = HeaderValue::from_str(headers.content_sha1)
            .map_err(|_| Error::InvalidHeader(HEADER_CONTENT_SHA1))?;
        let content_type = HeaderValue::from_str(headers.content_type)
            .map_err(|_| Error::InvalidHeader("Content-Type"))?;

        debug!(
            file_name = headers.file_name,
            bytes = headers.content_length,
            "uploading file body"
        );

        let resp = self
            .http
            .post(upload_url)
            .timeout(upload_deadline(self.timeout, headers.content_length))
            .header(AUTHORIZATION, token)
            .header(HEADER_FILE_NAME, file_name)
            .header(HEADER_CONTENT_SHA1, sha1)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, headers.content_length)
            .body(body)
            .send()
            .await?;
        read_json(resp).await
    }

    /// Performs an authenticated JSON POST.
    async fn post_json<Req, Resp>(&self, url: &str, auth_token: &str, body: &Req) -> Result<Resp, Error>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let token =
            HeaderValue::from_str(auth_token).map_err(|_| Error::InvalidHeader("Authorization"))?;
        let payload = serde_json::to_vec(body)?;

        let resp = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header(AUTHORIZATION, token)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(payload)
            .send()
            .await?;
        read_json(resp).await
    }
}

/// Percent-encodes a remote name for the `X-Bz-File-Name` header.
pub fn encode_file_name(name: &str) -> String {
    utf8_percent_encode(name, FILE_NAME_ENCODE_SET).to_string()
}

/// Whole-request deadline for an upload of `content_length` bytes.
pub fn upload_deadline(base: Duration, content_length: u64) -> Duration {
    base.saturating_add(Duration::from_secs(content_length / MIN_UPLOAD_BYTES_PER_SEC))
}

fn api_endpoint(api_url: &str, path: &str) -> String {
    format!("{}{path}", api_url.trim_end_matches('/'))
}

/// Decodes a success body, or turns an error status into [`Error::Api`].
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        let parsed: Option<ApiErrorBody> = serde_json::from_slice(&body).ok();
        return Err(match parsed {
            Some(err) => Error::Api {
                status: status.as_u16(),
                code: err.code,
                message: err.message,
            },
            None => Error::Api {
                status: status.as_u16(),
                code: String::new(),
                message: String::from_utf8_lossy(&body).into_owned(),
            },
        });
    }

    Ok(serde_json::from_slice(&body)?)
}
