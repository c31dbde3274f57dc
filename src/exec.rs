//! Scoped subprocess execution with a hard timeout.
//!
//! Every child is owned by a [`ChildGuard`]; whichever way the caller leaves
//! (normal exit, timeout, error, panic) the guard kills the whole process
//! tree and reaps the child before the pipes are drained.
//!
//! Output is drained on reader threads that report back over a channel. The
//! caller never waits on them past the timeout: a descendant that escaped
//! the process tree and still holds a pipe turns the run into a timeout and
//! its reader is left behind.
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt as _;

use crate::platform::Shell;
use crate::probes::ProbeError;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// Captured standard output, CRLF folded to LF, one trailing newline removed.
    pub stdout: String,
    /// Captured standard error, normalised like `stdout`.
    pub stderr: String,
    /// Exit status. Signal deaths are reported as `128 + signal` on Unix.
    pub code: i32,
}

impl ExecResult {
    /// Returns `true` if the process exited with status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run `command_line` through `shell`, killing it after `timeout`.
///
/// A non-zero exit status is returned as data; only launch failures and
/// timeouts are errors.
///
/// # Errors
///
/// Returns [`ProbeError::Launch`] if the interpreter cannot be spawned or
/// waited on, and [`ProbeError::Timeout`] if it runs longer than `timeout`.
pub fn run_shell(shell: Shell, command_line: &str, timeout: Duration) -> Result<ExecResult, ProbeError> {
    let mut cmd = Command::new(shell.program);
    cmd.args(shell.args).arg(command_line);
    execute(cmd, shell.program, timeout)
}

/// Run `program` with `args`, allowing failure (returns result without bailing).
///
/// # Errors
///
/// Same as [`run_shell`].
pub fn run_unchecked(program: &str, args: &[&str], timeout: Duration) -> Result<ExecResult, ProbeError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    execute(cmd, program, timeout)
}

fn execute(mut cmd: Command, program: &str, timeout: Duration) -> Result<ExecResult, ProbeError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    isolate(&mut cmd);

    let launch_err = |source: io::Error| ProbeError::Launch {
        program: program.to_string(),
        source,
    };

    let started = Instant::now();
    let child = cmd.spawn().map_err(launch_err)?;
    tracing::debug!("spawned {program} (pid {})", child.id());
    let mut guard = ChildGuard::new(child);

    // Drain both pipes concurrently so a chatty child never blocks on a full
    // pipe buffer while we wait on it.
    let (tx, rx) = mpsc::channel();
    let pending = spawn_reader(guard.child.stdout.take(), Pipe::Stdout, &tx)
        + spawn_reader(guard.child.stderr.take(), Pipe::Stderr, &tx);
    drop(tx);

    let waited = guard.wait(timeout);
    // Descendants may still hold the pipes open; the guard takes them down so
    // the readers see EOF.
    guard.release();

    let Some(status) = waited.map_err(launch_err)? else {
        tracing::warn!("{program} exceeded {timeout:?}; process tree killed");
        return Err(ProbeError::Timeout { timeout });
    };

    let deadline = started
        .checked_add(timeout)
        .map(|end| end.max(Instant::now() + READER_GRACE));
    let Some((stdout, stderr)) = collect_output(&rx, pending, deadline).map_err(launch_err)? else {
        tracing::warn!("{program} exited but its output stayed open past {timeout:?}");
        return Err(ProbeError::Timeout { timeout });
    };

    Ok(ExecResult {
        stdout: normalize_output(&stdout),
        stderr: normalize_output(&stderr),
        code: exit_code(status),
    })
}

/// Owns a spawned child and guarantees it is terminated and reaped.
struct ChildGuard {
    child: Child,
    reaped: bool,
    released: bool,
}

impl ChildGuard {
    const fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
            released: false,
        }
    }

    /// Wait up to `timeout`. `Ok(None)` means the child is still running.
    fn wait(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let status = self.child.wait_timeout(timeout)?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    /// Kill the process tree (including stragglers of an exited child) and
    /// reap the child if it has not been reaped yet.
    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        kill_process_tree(&mut self.child, self.reaped);
        if !self.reaped {
            let _ = self.child.wait();
            self.reaped = true;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Time granted to the readers after a child exits right at its deadline.
const READER_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipe {
    Stdout,
    Stderr,
}

type Captured = (Pipe, io::Result<Vec<u8>>);

/// Start draining `pipe` on its own thread. Returns how many results the
/// channel will carry for it.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>, which: Pipe, tx: &Sender<Captured>) -> usize {
    let Some(mut pipe) = pipe else {
        return 0;
    };
    let tx = tx.clone();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send((which, result));
    });
    1
}

/// Gather `pending` reader results. `Ok(None)` means `deadline` passed with a
/// pipe still open; `None` for `deadline` waits without limit.
fn collect_output(
    rx: &Receiver<Captured>,
    pending: usize,
    deadline: Option<Instant>,
) -> io::Result<Option<(Vec<u8>, Vec<u8>)>> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    for _ in 0..pending {
        let received = match deadline {
            Some(deadline) => rx.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok((Pipe::Stdout, result)) => stdout = result?,
            Ok((Pipe::Stderr, result)) => stderr = result?,
            Err(RecvTimeoutError::Timeout) => return Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io::Error::other("output reader thread panicked"));
            }
        }
    }
    Ok(Some((stdout, stderr)))
}

/// Decode captured bytes, fold CRLF to LF and drop one trailing line
/// terminator. Nothing else is trimmed.
pub(crate) fn normalize_output(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes).replace("\r\n", "\n");
    match text.strip_suffix('\n') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt as _;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Put the child in its own process group so the whole tree can be signalled.
#[cfg(unix)]
fn isolate(cmd: &mut Command) {
    use std::os::unix::process::CommandExt as _;
    cmd.process_group(0);
}

#[cfg(windows)]
fn isolate(cmd: &mut Command) {
    use std::os::windows::process::CommandExt as _;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(any(unix, windows)))]
const fn isolate(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child, reaped: bool) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        if !reaped {
            let _ = child.kill();
        }
        return;
    };
    // ESRCH just means every member is already gone.
    if killpg(Pid::from_raw(pgid), Signal::SIGKILL).is_err() && !reaped {
        let _ = child.kill();
    }
}

#[cfg(windows)]
fn kill_process_tree(child: &mut Child, reaped: bool) {
    if reaped {
        // The tree is rooted at a pid that no longer exists.
        return;
    }
    let pid = child.id().to_string();
    let killed = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success());
    if !killed {
        let _ = child.kill();
    }
}

#[cfg(not(any(unix, windows)))]
fn kill_process_tree(child: &mut Child, reaped: bool) {
    if !reaped {
        let _ = child.kill();
    }
}
