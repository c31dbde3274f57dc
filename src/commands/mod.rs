//! Subcommand handlers.
//!
//! Each handler returns the process exit code on a completed run. An `Err`
//! means the suite could not be loaded or the report could not be written,
//! and `main` maps it to [`EXIT_CONFIG_ERROR`].
pub mod check;
pub mod run;
pub mod version;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};

use crate::logging::Logger;
use crate::suite::{self, Overrides, Suite};

/// Every assertion passed.
pub const EXIT_OK: u8 = 0;
/// At least one assertion failed.
pub const EXIT_FAILED: u8 = 1;
/// The suite could not be built or the run could not be reported.
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// Load and compile the suite at `path`, logging what was found.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe a valid
/// suite.
pub fn load_suite(path: &Path, timeout: Option<Duration>, log: &Logger) -> Result<Suite> {
    log.stage(&format!("Loading suite {}", path.display()));
    let suite = suite::load(path, &Overrides { timeout })
        .with_context(|| format!("failed to load suite {}", path.display()))?;
    let settings = suite.settings();
    log.debug(&format!("default command timeout: {:?}", settings.timeout));
    log.debug(&format!(
        "suite settings: parallel={}, jobs={}",
        settings.parallel,
        settings
            .jobs
            .map_or_else(|| "default".to_string(), |n| n.to_string())
    ));
    log.info(&format!("{} assertions", suite.len()));
    Ok(suite)
}
