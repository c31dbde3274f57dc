//! Suites: ordered collections of assertions and how they are run.
pub mod loader;
pub mod report;
pub mod runner;

use std::time::Duration;

pub use loader::{Overrides, load, parse};
pub use report::{Format, SuiteReport, Summary};
pub use runner::SuiteRunner;

use crate::assertion::Assertion;
use crate::probes::DEFAULT_COMMAND_TIMEOUT;

/// Suite-wide defaults from the `[settings]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Default command timeout.
    pub timeout: Duration,
    /// Whether the CLI runs assertions concurrently.
    pub parallel: bool,
    /// Worker bound when parallel; `None` means rayon's default.
    pub jobs: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
            parallel: true,
            jobs: None,
        }
    }
}

/// An ordered, validated list of assertions.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    assertions: Vec<Assertion>,
    settings: Settings,
}

impl Suite {
    /// An empty suite with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty suite with the given settings.
    #[must_use]
    pub const fn with_settings(settings: Settings) -> Self {
        Self {
            assertions: Vec::new(),
            settings,
        }
    }

    /// Append an assertion; report order follows insertion order.
    pub fn push(&mut self, assertion: Assertion) {
        self.assertions.push(assertion);
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, assertion: Assertion) -> Self {
        self.push(assertion);
        self
    }

    /// The assertions in declaration order.
    #[must_use]
    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// Suite-wide settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Number of assertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    /// Whether the suite has no assertions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }
}
