//! Live progress tally and end-of-run summary.

use std::fmt::{self, Write};

use b2up_upload::{RunSummary, UploadEvent, UploadOutcome, UploadStatus};

/// Running count of files that reached a terminal state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    pub total: usize,
    pub uploaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn done(&self) -> usize {
        self.uploaded + self.skipped + self.failed
    }

    /// Counts terminal events; returns `true` when the tally changed.
    pub fn record(&mut self, event: &UploadEvent) -> bool {
        match event {
            UploadEvent::Uploaded { .. } => self.uploaded += 1,
            UploadEvent::Skipped { .. } => self.skipped += 1,
            UploadEvent::Failed { .. } => self.failed += 1,
            UploadEvent::Started { .. } | UploadEvent::AttemptFailed { .. } => return false,
        }
        true
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}]", self.done(), self.total)
    }
}

/// Renders the summary line followed by one line per failed file.
pub fn render(summary: &RunSummary, outcomes: &[UploadOutcome]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{summary} ({} bytes uploaded)", summary.uploaded_bytes);

    let failed: Vec<&UploadOutcome> = outcomes
        .iter()
        .filter(|o| o.status == UploadStatus::Failed)
        .collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "failed files:");
        for outcome in failed {
            let _ = writeln!(
                out,
                "  {} -> {} (attempts: {}): {}",
                outcome.path.display(),
                outcome.remote_name,
                outcome.attempts,
                outcome.last_error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn outcome(name: &str, status: UploadStatus, error: Option<&str>) -> UploadOutcome {
        UploadOutcome {
            path: PathBuf::from("/data").join(name),
            remote_name: name.into(),
            status,
            attempts: if status == UploadStatus::Failed { 3 } else { 1 },
            last_error: error.map(String::from),
            content_sha1: None,
            size_bytes: 4,
        }
    }

    #[test]
    fn progress_counts_only_terminal_events() {
        let mut progress = Progress::new(3);
        let events = [
            UploadEvent::Started {
                remote_name: "a.txt".into(),
                size_bytes: 4,
            },
            UploadEvent::Skipped {
                remote_name: "a.txt".into(),
            },
            UploadEvent::AttemptFailed {
                remote_name: "b.txt".into(),
                attempt: 1,
                error: "timeout".into(),
                retry_in: Some(std::time::Duration::from_secs(1)),
            },
            UploadEvent::Uploaded {
                remote_name: "b.txt".into(),
                attempts: 2,
                content_sha1: "abc".into(),
            },
        ];
        let changed: Vec<bool> = events.iter().map(|e| progress.record(e)).collect();

        assert_eq!(changed, [false, true, false, true]);
        assert_eq!(progress.to_string(), "[2/3]");

        progress.record(&UploadEvent::Failed {
            remote_name: "c.txt".into(),
            error: "retries exhausted".into(),
        });
        assert_eq!(
            progress,
            Progress {
                total: 3,
                uploaded: 1,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(progress.to_string(), "[3/3]");
    }

    #[test]
    fn all_good_has_no_failure_section() {
        let outcomes = vec![
            outcome("a.txt", UploadStatus::Uploaded, None),
            outcome("b.txt", UploadStatus::Skipped, None),
        ];
        let text = render(&RunSummary::from_outcomes(&outcomes), &outcomes);
        assert_eq!(
            text,
            "1 uploaded, 1 skipped (already present), 0 failed (4 bytes uploaded)\n"
        );
    }

    #[test]
    fn failures_are_listed() {
        let outcomes = vec![
            outcome("a.txt", UploadStatus::Uploaded, None),
            outcome("b.txt", UploadStatus::Failed, Some("retries exhausted")),
        ];
        let text = render(&RunSummary::from_outcomes(&outcomes), &outcomes);
        assert!(text.contains("failed files:"));
        assert!(text.contains("b.txt (attempts: 3): retries exhausted"));
        assert!(!text.contains("a.txt ->"));
    }
}
