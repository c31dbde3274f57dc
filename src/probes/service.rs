//! Service-registry probe.
//!
//! The host's service manager is an external collaborator; the engine only
//! consumes a boolean "is a service of this name registered" through the
//! [`ServiceRegistry`] seam.
#[cfg(target_os = "linux")]
use std::time::Duration;

use super::{ObservedState, ProbeError};

/// Budget for a single service-manager query.
#[cfg(target_os = "linux")]
const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers whether a service is registered on the host.
pub trait ServiceRegistry: Send + Sync {
    /// Returns `Ok(false)` for an unregistered service.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Unavailable`] when the registry itself cannot be
    /// queried; that is never conflated with "not installed".
    fn is_installed(&self, name: &str) -> Result<bool, ProbeError>;
}

/// Observe whether `name` is registered in `registry`.
///
/// # Errors
///
/// Propagates the registry's [`ProbeError`].
pub fn probe<R: ServiceRegistry + ?Sized>(
    registry: &R,
    name: &str,
) -> Result<ObservedState, ProbeError> {
    let installed = registry.is_installed(name)?;
    Ok(ObservedState::Service { installed })
}

/// The platform's own service manager.
///
/// - Windows: the SCM database under
///   `HKLM\SYSTEM\CurrentControlSet\Services`, read with `winreg`.
/// - Linux: `systemctl show --property=LoadState`.
/// - Anything else: always [`ProbeError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemServiceRegistry;

impl SystemServiceRegistry {
    /// Create the registry for the current host.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ServiceRegistry for SystemServiceRegistry {
    #[cfg(windows)]
    fn is_installed(&self, name: &str) -> Result<bool, ProbeError> {
        use winreg::RegKey;
        use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ};

        // Service names cannot contain backslashes; refuse to walk the tree.
        if name.is_empty() || name.contains('\\') {
            return Ok(false);
        }
        let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
        let subkey = format!(r"SYSTEM\CurrentControlSet\Services\{name}");
        match hklm.open_subkey_with_flags(&subkey, KEY_READ) {
            Ok(_) => Ok(true),
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ProbeError::Unavailable {
                mechanism: "service registry".to_string(),
                reason: e.to_string(),
            }),
        }
    }

    #[cfg(target_os = "linux")]
    fn is_installed(&self, name: &str) -> Result<bool, ProbeError> {
        systemd_is_installed(name)
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    fn is_installed(&self, _name: &str) -> Result<bool, ProbeError> {
        Err(ProbeError::Unavailable {
            mechanism: "service registry".to_string(),
            reason: format!("no service manager support for {}", std::env::consts::OS),
        })
    }
}

#[cfg(target_os = "linux")]
fn systemd_is_installed(name: &str) -> Result<bool, ProbeError> {
    use crate::exec;

    if which::which("systemctl").is_err() {
        return Err(ProbeError::Unavailable {
            mechanism: "systemctl".to_string(),
            reason: "not found on PATH".to_string(),
        });
    }

    let unit = unit_name(name);
    let result = exec::run_unchecked(
        "systemctl",
        &["show", "--property=LoadState", "--value", &unit],
        QUERY_TIMEOUT,
    )?;

    if !result.success() {
        if is_invalid_unit_name(&result.stderr) {
            // A name systemd rejects outright cannot be installed.
            return Ok(false);
        }
        return Err(ProbeError::Unavailable {
            mechanism: "systemctl".to_string(),
            reason: non_empty_or(result.stderr.trim(), || format!("exit {}", result.code)),
        });
    }

    parse_load_state(&result.stdout)
}

/// Append `.service` unless the name already carries a unit suffix.
#[cfg(any(target_os = "linux", test))]
fn unit_name(name: &str) -> String {
    const SUFFIXES: &[&str] = &[
        ".service", ".socket", ".timer", ".target", ".mount", ".path",
    ];
    if SUFFIXES.iter().any(|s| name.ends_with(s)) {
        name.to_string()
    } else {
        format!("{name}.service")
    }
}

#[cfg(any(target_os = "linux", test))]
fn is_invalid_unit_name(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("invalid unit name") || lower.contains("is not valid")
}

/// Map `LoadState` to "installed". `not-found` is the only negative answer;
/// `masked` and `error` units are still registered.
#[cfg(any(target_os = "linux", test))]
fn parse_load_state(stdout: &str) -> Result<bool, ProbeError> {
    match stdout.trim() {
        "not-found" => Ok(false),
        "" => Err(ProbeError::Unavailable {
            mechanism: "systemctl".to_string(),
            reason: "empty LoadState".to_string(),
        }),
        _ => Ok(true),
    }
}

#[cfg(any(target_os = "linux", test))]
fn non_empty_or(s: &str, fallback: impl FnOnce() -> String) -> String {
    if s.is_empty() { fallback() } else { s.to_string() }
}
