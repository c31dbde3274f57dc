//! Typed error variants for probe operations.
//!
//! A [`ProbeError`] means the host could not be observed at all. It is never
//! used for "the resource is absent" or "the command exited non-zero"; those
//! are successfully observed states.

use std::time::Duration;

use thiserror::Error;

/// Errors that prevent a probe from producing an observed state.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A filesystem query failed for a reason other than "not found".
    #[error("cannot inspect '{path}': {source}")]
    Io {
        /// Path that was being inspected.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The mechanism used to answer the query is missing or refused access.
    #[error("{mechanism} unavailable: {reason}")]
    Unavailable {
        /// Name of the host facility (e.g. `"systemctl"`, `"service registry"`).
        mechanism: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// The command interpreter could not be started.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        /// Interpreter that was being spawned.
        program: String,
        /// Underlying spawn or wait error.
        source: std::io::Error,
    },

    /// The command did not finish within its time budget and was killed.
    #[error("command timed out after {}", humanize(*timeout))]
    Timeout {
        /// The budget that was exceeded.
        timeout: Duration,
    },
}

impl ProbeError {
    /// Short machine-friendly tag for structured reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Unavailable { .. } => "unavailable",
            Self::Launch { .. } => "launch",
            Self::Timeout { .. } => "timeout",
        }
    }
}

fn humanize(timeout: Duration) -> String {
    if timeout.subsec_millis() == 0 {
        format!("{}s", timeout.as_secs())
    } else {
        format!("{}ms", timeout.as_millis())
    }
}
