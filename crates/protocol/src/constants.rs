//! Endpoint paths, header names and protocol defaults.

/// Base URL used for `b2_authorize_account`.
pub const DEFAULT_AUTH_URL: &str = "https://api.backblazeb2.com";

/// Account authorization (GET, Basic auth).
pub const AUTHORIZE_ACCOUNT_PATH: &str = "/b2api/v1/b2_authorize_account";

/// Bucket listing (POST, relative to `apiUrl`).
pub const LIST_BUCKETS_PATH: &str = "/b2api/v1/b2_list_buckets";

/// File-name listing (POST, relative to `apiUrl`).
pub const LIST_FILE_NAMES_PATH: &str = "/b2api/v1/b2_list_file_names";

/// Upload URL issuance (POST, relative to `apiUrl`).
pub const GET_UPLOAD_URL_PATH: &str = "/b2api/v1/b2_get_upload_url";

/// Remote object name (percent-encoded).
pub const HEADER_FILE_NAME: &str = "X-Bz-File-Name";

/// Hex SHA-1 of the request body.
pub const HEADER_CONTENT_SHA1: &str = "X-Bz-Content-Sha1";

/// Content type that lets the service infer the MIME type from the name.
pub const DEFAULT_CONTENT_TYPE: &str = "b2/x-auto";

/// Largest `maxFileCount` the listing call accepts.
pub const MAX_LIST_FILE_COUNT: u32 = 10_000;

/// Longest remote name the service accepts, in UTF-8 bytes.
pub const MAX_FILE_NAME_BYTES: usize = 1024;
