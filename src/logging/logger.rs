//! Console logger facade and run summary.
use std::path::{Path, PathBuf};

use super::STAGE_TARGET;
use crate::suite::{SuiteReport, Summary};

/// Thin facade over [`tracing`] used by the command handlers.
///
/// Everything goes through the global subscriber, so the same call reaches
/// the console and (when configured) the log file.
#[derive(Debug, Default)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

#[allow(clippy::unused_self)]
impl Logger {
    /// Create a logger. `log_file` is only remembered for the summary; the
    /// file itself is written by the subscriber.
    #[must_use]
    pub fn new(log_file: Option<&Path>) -> Self {
        Self {
            log_file: log_file.map(Path::to_path_buf),
        }
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (console only with `-v`; always in the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log one coloured line per assertion followed by the counts.
    pub fn print_summary(&self, report: &SuiteReport) {
        self.stage("Summary");
        for result in report.results() {
            let (icon, color) = if result.passed() {
                ("✓", "\x1b[32m")
            } else {
                ("✗", "\x1b[31m")
            };
            self.info(&format!("{color}{icon} {}\x1b[0m", result.descriptor));
        }
        self.info(&summary_line(report.summary()));
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

fn summary_line(summary: Summary) -> String {
    let Summary {
        total,
        passed,
        failed,
    } = summary;
    format!("{total} assertions: \x1b[32m{passed} passed\x1b[0m, \x1b[31m{failed} failed\x1b[0m")
}
