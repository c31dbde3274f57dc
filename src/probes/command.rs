//! Command-execution probe.
use std::time::Duration;

use super::{ObservedState, ProbeError};
use crate::exec;
use crate::platform::Shell;

/// Run `line` through `shell` and capture its exit status and output.
///
/// The child runs in a scoped process tree that is torn down on return,
/// whether it exited on its own or was killed for exceeding `timeout`.
///
/// # Errors
///
/// Returns [`ProbeError::Launch`] if the interpreter cannot be started and
/// [`ProbeError::Timeout`] if the command outlives `timeout`.
pub fn probe(shell: Shell, line: &str, timeout: Duration) -> Result<ObservedState, ProbeError> {
    let result = exec::run_shell(shell, line, timeout)?;
    tracing::debug!(
        "command exited {} ({} bytes stdout, {} bytes stderr)",
        result.code,
        result.stdout.len(),
        result.stderr.len()
    );
    Ok(ObservedState::Command {
        exit_status: result.code,
        stdout: result.stdout,
        stderr: result.stderr,
    })
}
