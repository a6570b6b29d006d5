use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Response of `b2_authorize_account`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeAccountResponse {
    pub account_id: String,
    pub authorization_token: String,
    pub api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub download_url: String,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub recommended_part_size: u64,
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Request body of `b2_list_buckets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBucketsRequest {
    pub account_id: String,
}

/// A bucket as reported by `b2_list_buckets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub bucket_id: String,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bucket_type: String,
}

/// Response of `b2_list_buckets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListBucketsResponse {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

// ---------------------------------------------------------------------------
// File listing
// ---------------------------------------------------------------------------

/// Request body of `b2_list_file_names`.
///
/// Listings are ordered by name, so starting at the exact name we are
/// looking for puts it first when it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileNamesRequest {
    pub bucket_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_count: Option<u32>,
}

/// One entry of a file-name listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileName {
    pub file_name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
}

/// Response of `b2_list_file_names`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFileNamesResponse {
    #[serde(default)]
    pub files: Vec<FileName>,
    #[serde(default)]
    pub next_file_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// Request body of `b2_get_upload_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUploadUrlRequest {
    pub bucket_id: String,
}

/// Response of `b2_get_upload_url`: a single-use upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUploadUrlResponse {
    #[serde(default)]
    pub bucket_id: String,
    pub upload_url: String,
    pub authorization_token: String,
}

/// Response of a file upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub file_name: String,
    pub content_sha1: String,
    #[serde(default)]
    pub content_length: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// JSON body returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

fn is_zero_u64(v: &u64) -> bool {
    *v == 0
}
