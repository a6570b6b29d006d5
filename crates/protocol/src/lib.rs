//! Wire types for the B2 native API calls used by b2up.
//!
//! Only the handful of calls the uploader needs are modelled here:
//! account authorization, bucket listing, file-name listing, upload URL
//! issuance and the upload itself. Field names follow the API's camelCase
//! JSON.

pub mod constants;
pub mod messages;

// Re-export primary types for convenience.
pub use constants::DEFAULT_CONTENT_TYPE;
pub use messages::{
    ApiErrorBody, AuthorizeAccountResponse, Bucket, FileName, GetUploadUrlRequest,
    GetUploadUrlResponse, ListBucketsRequest, ListBucketsResponse, ListFileNamesRequest,
    ListFileNamesResponse, UploadFileResponse,
};
