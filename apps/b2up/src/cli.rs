//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "b2up",
    version,
    about = "Bulk-upload a local directory to a Backblaze B2 bucket"
)]
pub struct Cli {
    /// B2 account ID (falls back to `B2_ACCOUNT_ID`, then the config file)
    #[arg(short = 'i', long)]
    pub account_id: Option<String>,

    /// B2 application key (falls back to `B2_APPLICATION_KEY`, then the config file)
    #[arg(short = 'a', long)]
    pub application_key: Option<String>,

    /// Directory to upload
    #[arg(short = 'd', long)]
    pub directory: PathBuf,

    /// Number of concurrent upload workers (values below 2 are raised to 2)
    #[arg(short = 'm', long)]
    pub multithreads: Option<usize>,

    /// Descend into subdirectories
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Target bucket name (defaults to the account's first bucket)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Content type sent with every file (default: `b2/x-auto`)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Attempts per file, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long)]
    pub retry_delay_secs: Option<u64>,

    /// Double the retry delay after each failed attempt
    #[arg(long)]
    pub exponential_backoff: bool,

    /// Per-request HTTP timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Path to the JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
