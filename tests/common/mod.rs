// Shared helpers for integration tests.
//
// Provides a temporary directory for suite files and a scripted prober so
// scenario tests can describe a host without touching the real one.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hostspec::probes::{ObservedState, ProbeError, ProbeOptions, Prober, ResourceDescriptor};

/// A temporary directory holding suite files and fixtures.
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `body` to `name` inside the workspace and return its path.
    pub fn write(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).expect("write fixture");
        path
    }

    /// Create a directory inside the workspace and return its path as a
    /// forward-slash string suitable for a suite file.
    pub fn mkdir(&self, name: &str) -> String {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path).expect("create fixture dir");
        toml_path(&path)
    }

    /// Absolute path of `name` inside the workspace, whether or not it exists.
    pub fn child(&self, name: &str) -> String {
        toml_path(&self.dir.path().join(name))
    }
}

/// Render a path so it can be embedded in a TOML basic string.
pub fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// What a [`ScriptedProber`] answers for one target.
#[derive(Clone)]
pub enum Scripted {
    /// Return this state.
    State(ObservedState),
    /// Fail as if the service manager were missing.
    Unavailable,
}

/// A prober that answers from a fixed table keyed by descriptor target.
///
/// Unknown targets are reported as missing files / unregistered services, so
/// a table only needs the resources that exist.
#[derive(Default)]
pub struct ScriptedProber {
    answers: HashMap<String, Scripted>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(mut self, path: &str) -> Self {
        self.answers.insert(
            path.to_string(),
            Scripted::State(ObservedState::File {
                exists: true,
                is_directory: true,
            }),
        );
        self
    }

    pub fn file(mut self, path: &str) -> Self {
        self.answers.insert(
            path.to_string(),
            Scripted::State(ObservedState::File {
                exists: true,
                is_directory: false,
            }),
        );
        self
    }

    pub fn service(mut self, name: &str) -> Self {
        self.answers.insert(
            name.to_string(),
            Scripted::State(ObservedState::Service { installed: true }),
        );
        self
    }

    pub fn unavailable(mut self, name: &str) -> Self {
        self.answers.insert(name.to_string(), Scripted::Unavailable);
        self
    }

    pub fn command(mut self, line: &str, exit_status: i32, stdout: &str) -> Self {
        self.answers.insert(
            line.to_string(),
            Scripted::State(ObservedState::Command {
                exit_status,
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        );
        self
    }
}

impl Prober for ScriptedProber {
    fn probe(
        &self,
        descriptor: &ResourceDescriptor,
        _options: &ProbeOptions,
    ) -> Result<ObservedState, ProbeError> {
        match self.answers.get(descriptor.target()) {
            Some(Scripted::State(state)) => Ok(state.clone()),
            Some(Scripted::Unavailable) => Err(ProbeError::Unavailable {
                mechanism: "service registry".to_string(),
                reason: "access denied".to_string(),
            }),
            None => Ok(match descriptor {
                ResourceDescriptor::File(_) => ObservedState::File {
                    exists: false,
                    is_directory: false,
                },
                ResourceDescriptor::Service(_) => ObservedState::Service { installed: false },
                ResourceDescriptor::Command(line) => {
                    panic!("no scripted answer for command {line}")
                }
            }),
        }
    }
}
