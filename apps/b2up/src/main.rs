//! `b2up`: bulk-upload a local directory tree to a Backblaze B2 bucket.

mod adapter;
mod cli;
mod config;
mod report;
mod session;

#[cfg(test)]
mod testing;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use b2up_client::Client;
use b2up_upload::{RunSummary, UploadEvent, UploadOrchestrator, scan_files_for_upload};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapter::B2Adapter;
use crate::cli::Cli;
use crate::config::{Settings, UploaderConfig};
use crate::report::Progress;

/// Exit status when the run completed but some files failed.
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info,b2up=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting b2up");

    let file_config = UploaderConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file_config, |key| std::env::var(key).ok())?;
    debug!(settings = ?settings, "resolved settings");

    let summary = run(settings).await?;
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    }
}

/// Authorizes, scans the directory and uploads every file.
async fn run(settings: Settings) -> anyhow::Result<RunSummary> {
    let client = Client::new(settings.client.clone()).context("building HTTP client")?;

    let session = session::establish(
        &client,
        &settings.account_id,
        &settings.application_key,
        settings.bucket.as_deref(),
    )
    .await?;

    let (files, total_size) = scan_files_for_upload(&settings.directory, settings.recursive)
        .with_context(|| format!("scanning {}", settings.directory.display()))?;
    info!(
        directory = %settings.directory.display(),
        files = files.len(),
        total_size,
        recursive = settings.recursive,
        "directory scanned"
    );

    let storage = Arc::new(B2Adapter::new(client));
    let mut orchestrator = UploadOrchestrator::new(storage, session, settings.upload.clone());

    let progress = Progress::new(files.len());
    if let Some(events) = orchestrator.take_events() {
        tokio::spawn(log_events(events, progress));
    }

    let cancel = orchestrator.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight uploads");
            cancel.cancel();
        }
    });

    let outcomes = orchestrator.run(&settings.directory, files).await;
    let summary = RunSummary::from_outcomes(&outcomes);

    print!("{}", report::render(&summary, &outcomes));
    if summary.is_success() {
        info!(%summary, "upload run complete");
    } else {
        error!(%summary, "upload run finished with failures");
    }
    Ok(summary)
}

/// Logs each file as it settles, prefixed with the running `[done/total]` count.
async fn log_events(mut events: mpsc::Receiver<UploadEvent>, mut progress: Progress) {
    while let Some(event) = events.recv().await {
        progress.record(&event);
        match event {
            UploadEvent::Started {
                remote_name,
                size_bytes,
            } => debug!(remote_name = %remote_name, size_bytes, "processing"),
            UploadEvent::Skipped { remote_name } => {
                info!(%progress, remote_name = %remote_name, "already present, skipped")
            }
            UploadEvent::AttemptFailed {
                remote_name,
                attempt,
                error,
                retry_in: Some(delay),
            } => warn!(remote_name = %remote_name, attempt, error = %error, retry_in = ?delay, "attempt failed, retrying"),
            UploadEvent::AttemptFailed {
                remote_name,
                attempt,
                error,
                retry_in: None,
            } => debug!(remote_name = %remote_name, attempt, error = %error, "final attempt failed"),
            UploadEvent::Uploaded {
                remote_name,
                attempts,
                content_sha1,
            } => info!(%progress, remote_name = %remote_name, attempts, sha1 = %content_sha1, "uploaded"),
            UploadEvent::Failed { remote_name, error } => {
                warn!(%progress, remote_name = %remote_name, error = %error, "upload failed")
            }
        }
    }
    debug!(
        uploaded = progress.uploaded,
        skipped = progress.skipped,
        failed = progress.failed,
        "event stream closed"
    );
}
