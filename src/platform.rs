//! Platform detection and command interpreter selection.
use std::fmt;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    /// Linux and other Unix-like hosts.
    Linux,
    /// Microsoft Windows.
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Command interpreter used to run a command-line probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shell {
    /// Interpreter executable.
    pub program: &'static str,
    /// Arguments placed before the command line itself.
    pub args: &'static [&'static str],
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub const fn detect() -> Self {
        Self {
            os: Self::detect_os(),
        }
    }

    /// Create a platform with an explicit OS (for testing).
    #[must_use]
    pub const fn new(os: Os) -> Self {
        Self { os }
    }

    /// The interpreter that receives command lines on this platform.
    ///
    /// Command lines are passed through opaquely; the engine never parses
    /// them.
    #[must_use]
    pub const fn shell(&self) -> Shell {
        match self.os {
            Os::Windows => Shell {
                program: "powershell",
                args: &["-NoProfile", "-NonInteractive", "-Command"],
            },
            Os::Linux => Shell {
                program: "sh",
                args: &["-c"],
            },
        }
    }

    const fn detect_os() -> Os {
        if cfg!(target_os = "windows") {
            Os::Windows
        } else {
            // Default to Linux for other Unix-like systems
            Os::Linux
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_detect_returns_valid() {
        let p = Platform::detect();
        let expected = if cfg!(target_os = "windows") { Os::Windows } else { Os::Linux };
        assert_eq!(p.os, expected);
    }

    #[test]
    fn platform_new_linux() {
        assert_eq!(Platform::new(Os::Linux).os, Os::Linux);
    }

    #[test]
    fn platform_new_windows() {
        assert_eq!(Platform::new(Os::Windows).os, Os::Windows);
    }

    #[test]
    fn linux_shell_is_sh() {
        let shell = Platform::new(Os::Linux).shell();
        assert_eq!(shell.program, "sh");
        assert_eq!(shell.args, &["-c"]);
    }

    #[test]
    fn windows_shell_is_powershell() {
        let shell = Platform::new(Os::Windows).shell();
        assert_eq!(shell.program, "powershell");
        assert_eq!(shell.args.last(), Some(&"-Command"));
    }

    #[test]
    fn os_display() {
        assert_eq!(Os::Linux.to_string(), "linux");
        assert_eq!(Os::Windows.to_string(), "windows");
    }
}
