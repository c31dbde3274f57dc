//! Command: validate a suite without touching the host.
use std::io::{self, Write as _};

use anyhow::Result;

use crate::cli::CheckOpts;
use crate::logging::Logger;

/// Load and compile the suite, then print how many assertions it holds.
///
/// # Errors
///
/// Returns an error if the suite is invalid.
pub fn run(opts: &CheckOpts, log: &Logger) -> Result<u8> {
    let suite = super::load_suite(&opts.suite, None, log)?;
    for assertion in suite.assertions() {
        let kind = assertion.descriptor().kind();
        let expectations = assertion
            .predicates()
            .iter()
            .map(|p| p.describe(kind))
            .collect::<Vec<_>>()
            .join(", ");
        log.debug(&format!("{} {expectations}", assertion.descriptor()));
    }
    writeln!(
        io::stdout().lock(),
        "{}: {} assertions OK",
        opts.suite.display(),
        suite.len()
    )?;
    Ok(super::EXIT_OK)
}
