//! Uploader configuration.
//!
//! Optional JSON file at `~/.config/b2up/config.json` (or
//! `%APPDATA%\b2up\config.json` on Windows). Values are layered as
//! CLI flag > environment > file > built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::bail;
use b2up_client::ClientOptions;
use b2up_protocol::constants::{DEFAULT_AUTH_URL, DEFAULT_CONTENT_TYPE};
use b2up_upload::types::{DEFAULT_CONCURRENCY, DEFAULT_PROBE_PAGE_SIZE};
use b2up_upload::{Backoff, RetryPolicy, UploadConfig};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

const ENV_ACCOUNT_ID: &str = "B2_ACCOUNT_ID";
const ENV_APPLICATION_KEY: &str = "B2_APPLICATION_KEY";
const ENV_BUCKET: &str = "B2_BUCKET";

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 30;
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Exponential backoff stops growing at this multiple of the base delay.
const BACKOFF_CEILING_FACTOR: u32 = 16;

/// Contents of the config file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploaderConfig {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub application_key: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub retry_delay_secs: Option<u64>,
    #[serde(default)]
    pub exponential_backoff: Option<bool>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub auth_url: Option<String>,
}

impl UploaderConfig {
    /// Loads the config file at `path`, or the default location.
    ///
    /// A missing file yields defaults. An unparsable file is logged and
    /// also yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str::<UploaderConfig>(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                Ok(Self::default())
            }
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Clone)]
pub struct Settings {
    pub account_id: String,
    pub application_key: String,
    pub bucket: Option<String>,
    pub directory: PathBuf,
    pub recursive: bool,
    pub upload: UploadConfig,
    pub client: ClientOptions,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("account_id", &self.account_id)
            .field("application_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("directory", &self.directory)
            .field("recursive", &self.recursive)
            .field("upload", &self.upload)
            .field("client", &self.client)
            .finish()
    }
}

impl Settings {
    /// Merges CLI flags, environment and file values.
    ///
    /// `env` looks up an environment variable; empty values count as unset.
    pub fn resolve(
        cli: &Cli,
        file: UploaderConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let Some(account_id) = cli
            .account_id
            .clone()
            .or_else(|| lookup(ENV_ACCOUNT_ID))
            .or(file.account_id)
        else {
            bail!("missing account ID: pass --account-id or set {ENV_ACCOUNT_ID}");
        };
        let Some(application_key) = cli
            .application_key
            .clone()
            .or_else(|| lookup(ENV_APPLICATION_KEY))
            .or(file.application_key)
        else {
            bail!("missing application key: pass --application-key or set {ENV_APPLICATION_KEY}");
        };
        let bucket = cli.bucket.clone().or_else(|| lookup(ENV_BUCKET)).or(file.bucket);

        if !cli.directory.is_dir() {
            bail!("{} is not a directory", cli.directory.display());
        }

        let retry_delay = Duration::from_secs(
            cli.retry_delay_secs
                .or(file.retry_delay_secs)
                .unwrap_or(DEFAULT_RETRY_DELAY_SECS),
        );
        let exponential = cli.exponential_backoff || file.exponential_backoff.unwrap_or(false);
        let backoff = if exponential {
            Backoff::Exponential {
                initial: retry_delay,
                max: retry_delay.saturating_mul(BACKOFF_CEILING_FACTOR),
                factor: 2.0,
            }
        } else {
            Backoff::Fixed(retry_delay)
        };

        let upload = UploadConfig {
            concurrency: cli
                .multithreads
                .or(file.concurrency)
                .unwrap_or(DEFAULT_CONCURRENCY),
            content_type: cli
                .content_type
                .clone()
                .or(file.content_type)
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            retry: RetryPolicy {
                max_attempts: cli
                    .max_attempts
                    .or(file.max_attempts)
                    .unwrap_or(DEFAULT_MAX_ATTEMPTS)
                    .max(1),
                backoff,
            },
            probe_page_size: DEFAULT_PROBE_PAGE_SIZE,
        };

        let client = ClientOptions {
            timeout: Duration::from_secs(
                cli.timeout_secs
                    .or(file.request_timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            connect_timeout: CONNECT_TIMEOUT,
            auth_url: file.auth_url.unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
        };

        Ok(Self {
            account_id,
            application_key,
            bucket,
            directory: cli.directory.clone(),
            recursive: cli.recursive,
            upload,
            client,
        })
    }
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("b2up").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home).join(".config"))
    }
}
