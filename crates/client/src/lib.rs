//! Async client for the B2 native API.
//!
//! Covers the calls b2up needs: account authorization, bucket listing,
//! file-name listing, upload URL issuance and single-request uploads.
//! The client is stateless; callers pass the API URL and tokens obtained
//! from authorization explicitly.

pub mod client;

pub use client::{
    Client, ClientOptions, Error, MIN_UPLOAD_BYTES_PER_SEC, UploadHeaders, encode_file_name,
    upload_deadline,
};
