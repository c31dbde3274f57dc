//! Command: print version information.
use std::io::{self, Write as _};

use anyhow::Result;

/// Version string reported by `hostspec version`.
#[must_use]
pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Print the hostspec version to stdout.
///
/// # Errors
///
/// Returns an error if stdout is closed.
pub fn run() -> Result<u8> {
    writeln!(io::stdout().lock(), "hostspec {}", version())?;
    Ok(super::EXIT_OK)
}
