//! Read-only observation of host resources.
//!
//! A [`ResourceDescriptor`] names something on the host; a [`Prober`] turns it
//! into an [`ObservedState`]. Absence is an observation, not an error: only a
//! failure of the observation mechanism itself yields a [`ProbeError`].
pub mod command;
pub mod error;
pub mod file;
pub mod service;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

pub use error::ProbeError;
pub use service::{ServiceRegistry, SystemServiceRegistry};

use crate::platform::Platform;

/// Default budget for a command-line probe.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Identifies a host resource to observe. Immutable once constructed.
///
/// # Examples
///
/// ```
/// use hostspec::probes::{ResourceDescriptor, ResourceKind};
///
/// let dir = ResourceDescriptor::file("c:/Octopus");
/// assert_eq!(dir.kind(), ResourceKind::File);
/// assert_eq!(dir.to_string(), "file 'c:/Octopus'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "target")]
pub enum ResourceDescriptor {
    /// A filesystem path (file or directory).
    File(String),
    /// A service registered with the host's service manager.
    Service(String),
    /// A command line handed opaquely to the host interpreter.
    Command(String),
}

impl ResourceDescriptor {
    /// Describe a filesystem path.
    #[must_use]
    pub fn file(path: impl Into<String>) -> Self {
        Self::File(path.into())
    }

    /// Describe a service by name.
    #[must_use]
    pub fn service(name: impl Into<String>) -> Self {
        Self::Service(name.into())
    }

    /// Describe a command line.
    #[must_use]
    pub fn command(line: impl Into<String>) -> Self {
        Self::Command(line.into())
    }

    /// The kind of resource, used to check predicate compatibility.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::File(_) => ResourceKind::File,
            Self::Service(_) => ResourceKind::Service,
            Self::Command(_) => ResourceKind::Command,
        }
    }

    /// The path, service name or command line.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::File(s) | Self::Service(s) | Self::Command(s) => s,
        }
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind(), self.target())
    }
}

/// The three families of resource the engine can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Filesystem entry.
    File,
    /// Registered service.
    Service,
    /// Command execution.
    Command,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Service => write!(f, "service"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// Snapshot of a resource taken by a single probe.
///
/// Exactly one variant is populated and it always matches the kind of the
/// descriptor that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ObservedState {
    /// Result of a filesystem probe.
    File {
        /// Whether anything exists at the path.
        exists: bool,
        /// Whether the entry is a directory.
        is_directory: bool,
    },
    /// Result of a service-registry probe.
    Service {
        /// Whether a service of that name is registered.
        installed: bool,
    },
    /// Result of running a command.
    Command {
        /// Process exit status.
        exit_status: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
}

impl ObservedState {
    /// The kind of resource this snapshot describes.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::File { .. } => ResourceKind::File,
            Self::Service { .. } => ResourceKind::Service,
            Self::Command { .. } => ResourceKind::Command,
        }
    }
}

/// Per-probe knobs supplied by the assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Upper bound on command execution time.
    pub timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

/// Anything that can observe a resource.
///
/// Implementations must be free of side effects for file and service
/// descriptors. `Send + Sync` so a suite can be probed from a worker pool.
pub trait Prober: Send + Sync {
    /// Observe `descriptor` right now.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] when the observation mechanism fails (I/O
    /// fault, unavailable service manager, launch failure, timeout).
    fn probe(
        &self,
        descriptor: &ResourceDescriptor,
        options: &ProbeOptions,
    ) -> Result<ObservedState, ProbeError>;
}

/// Probes the real host: filesystem, service manager and command interpreter.
#[derive(Debug)]
pub struct HostProber<S = SystemServiceRegistry> {
    platform: Platform,
    services: S,
}

impl HostProber {
    /// A prober for the current platform backed by the system service manager.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            platform: Platform::detect(),
            services: SystemServiceRegistry::new(),
        }
    }
}

impl Default for HostProber {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ServiceRegistry> HostProber<S> {
    /// A prober with a caller-supplied service registry.
    #[must_use]
    pub const fn with_services(platform: Platform, services: S) -> Self {
        Self { platform, services }
    }
}

impl<S: ServiceRegistry + Send + Sync> Prober for HostProber<S> {
    fn probe(
        &self,
        descriptor: &ResourceDescriptor,
        options: &ProbeOptions,
    ) -> Result<ObservedState, ProbeError> {
        tracing::debug!("probing {descriptor}");
        match descriptor {
            ResourceDescriptor::File(path) => file::probe(path),
            ResourceDescriptor::Service(name) => service::probe(&self.services, name),
            ResourceDescriptor::Command(line) => {
                command::probe(self.platform.shell(), line, options.timeout)
            }
        }
    }
}


#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_kinds() {
        assert_eq!(ResourceDescriptor::file("/tmp").kind(), ResourceKind::File);
        assert_eq!(
            ResourceDescriptor::service("sshd").kind(),
            ResourceKind::Service
        );
        assert_eq!(
            ResourceDescriptor::command("true").kind(),
            ResourceKind::Command
        );
    }

    #[test]
    fn descriptor_display_names_kind_and_target() {
        let d = ResourceDescriptor::service("OctopusDeploy Tentacle");
        assert_eq!(d.to_string(), "service 'OctopusDeploy Tentacle'");
    }

    #[test]
    fn observed_state_kind_matches_variant() {
        let s = ObservedState::Command {
            exit_status: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(s.kind(), ResourceKind::Command);
        assert_eq!(
            ObservedState::Service { installed: false }.kind(),
            ResourceKind::Service
        );
    }

    #[test]
    fn descriptor_serializes_as_tagged_record() {
        let json = serde_json::to_value(ResourceDescriptor::file("c:/Octopus")).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["target"], "c:/Octopus");
    }

    #[test]
    fn host_prober_observes_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.exe");
        let state = HostProber::new()
            .probe(
                &ResourceDescriptor::file(path.to_string_lossy()),
                &ProbeOptions::default(),
            )
            .unwrap();
        assert_eq!(
            state,
            ObservedState::File {
                exists: false,
                is_directory: false
            }
        );
    }
}
