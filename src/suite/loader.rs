//! TOML suite files.
//!
//! A suite file has an optional `[settings]` table and any number of
//! `[[assert]]` tables. Every entry is turned into an [`Assertion`] while the
//! file is loaded, so a suite that loads is guaranteed to run.
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::{Settings, Suite};
use crate::assertion::Assertion;
use crate::error::SuiteError;
use crate::matchers::{Predicate, Stream};
use crate::probes::{ResourceDescriptor, ResourceKind};

/// Values supplied on the command line; they win over `[settings]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Default command timeout.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSuite {
    #[serde(default)]
    settings: RawSettings,
    #[serde(default, rename = "assert")]
    asserts: Vec<RawAssert>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    timeout_secs: Option<u64>,
    parallel: Option<bool>,
    jobs: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAssert {
    name: Option<String>,
    file: Option<String>,
    service: Option<String>,
    command: Option<String>,
    exists: Option<bool>,
    directory: Option<bool>,
    regular_file: Option<bool>,
    installed: Option<bool>,
    exit_status: Option<i32>,
    stdout: Option<String>,
    stderr: Option<String>,
    stdout_excludes: Option<String>,
    stderr_excludes: Option<String>,
    timeout_secs: Option<u64>,
}

impl RawAssert {
    /// Keys that were set, paired with the resource kind they belong to.
    fn present_keys(&self) -> Vec<(&'static str, ResourceKind)> {
        let keys = [
            ("exists", self.exists.is_some(), ResourceKind::File),
            ("directory", self.directory.is_some(), ResourceKind::File),
            ("regular_file", self.regular_file.is_some(), ResourceKind::File),
            ("installed", self.installed.is_some(), ResourceKind::Service),
            ("exit_status", self.exit_status.is_some(), ResourceKind::Command),
            ("stdout", self.stdout.is_some(), ResourceKind::Command),
            ("stderr", self.stderr.is_some(), ResourceKind::Command),
            ("stdout_excludes", self.stdout_excludes.is_some(), ResourceKind::Command),
            ("stderr_excludes", self.stderr_excludes.is_some(), ResourceKind::Command),
            ("timeout_secs", self.timeout_secs.is_some(), ResourceKind::Command),
        ];
        keys.into_iter()
            .filter(|(_, present, _)| *present)
            .map(|(key, _, kind)| (key, kind))
            .collect()
    }
}

/// Read and compile the suite at `path`.
///
/// # Errors
///
/// Returns [`SuiteError::Read`] if the file cannot be read, and any error
/// from [`parse`].
pub fn load(path: &Path, overrides: &Overrides) -> Result<Suite, SuiteError> {
    let content = std::fs::read_to_string(path).map_err(|source| SuiteError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, &path.display().to_string(), overrides)
}

/// Compile suite text. `origin` names the source in error messages.
///
/// # Errors
///
/// Returns [`SuiteError::Parse`] for malformed TOML or unknown keys, and
/// [`SuiteError::InvalidEntry`] for an entry that does not describe a valid
/// assertion.
pub fn parse(content: &str, origin: &str, overrides: &Overrides) -> Result<Suite, SuiteError> {
    let raw: RawSuite = toml::from_str(content).map_err(|e| SuiteError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })?;

    let settings = resolve_settings(&raw.settings, origin, overrides)?;
    let mut suite = Suite::with_settings(settings);
    for (i, entry) in raw.asserts.into_iter().enumerate() {
        suite.push(build_entry(i + 1, entry, settings.timeout)?);
    }
    tracing::debug!("loaded {} assertions from {origin}", suite.len());
    Ok(suite)
}

fn resolve_settings(
    raw: &RawSettings,
    origin: &str,
    overrides: &Overrides,
) -> Result<Settings, SuiteError> {
    let invalid = |message: String| SuiteError::Parse {
        path: origin.to_string(),
        message,
    };
    let defaults = Settings::default();
    let file_timeout = raw
        .timeout_secs
        .map(|secs| positive_secs(secs, "settings.timeout_secs"))
        .transpose()
        .map_err(invalid)?;
    if raw.jobs == Some(0) {
        return Err(invalid("settings.jobs must be at least 1".to_string()));
    }
    Ok(Settings {
        timeout: overrides
            .timeout
            .or(file_timeout)
            .unwrap_or(defaults.timeout),
        parallel: raw.parallel.unwrap_or(defaults.parallel),
        jobs: raw.jobs.or(defaults.jobs),
    })
}

fn positive_secs(secs: u64, key: &str) -> Result<Duration, String> {
    if secs == 0 {
        return Err(format!("{key} must be at least 1"));
    }
    Ok(Duration::from_secs(secs))
}

fn build_entry(index: usize, raw: RawAssert, default_timeout: Duration) -> Result<Assertion, SuiteError> {
    let invalid = |reason: String| SuiteError::InvalidEntry { index, reason };

    let descriptor = match (&raw.file, &raw.service, &raw.command) {
        (Some(path), None, None) => ResourceDescriptor::file(path),
        (None, Some(name), None) => ResourceDescriptor::service(name),
        (None, None, Some(line)) => ResourceDescriptor::command(line),
        _ => {
            return Err(invalid(
                "exactly one of file, service or command is required".to_string(),
            ));
        }
    };
    let kind = descriptor.kind();

    if let Some((key, _)) = raw.present_keys().into_iter().find(|(_, k)| *k != kind) {
        return Err(invalid(format!("key '{key}' does not apply to a {kind} resource")));
    }

    let mut predicates = Vec::new();
    match raw.exists {
        Some(true) => predicates.push(Predicate::Exists),
        Some(false) => predicates.push(Predicate::NotExists),
        None => {}
    }
    if let Some(p) = flag(raw.directory, "directory", Predicate::IsDirectory).map_err(invalid)? {
        predicates.push(p);
    }
    if let Some(p) = flag(raw.regular_file, "regular_file", Predicate::IsFile).map_err(invalid)? {
        predicates.push(p);
    }
    match raw.installed {
        Some(true) => predicates.push(Predicate::Exists),
        Some(false) => predicates.push(Predicate::NotExists),
        None => {}
    }
    if let Some(code) = raw.exit_status {
        predicates.push(Predicate::Equals(code));
    }
    let patterns = [
        (raw.stdout, Stream::Stdout, true),
        (raw.stderr, Stream::Stderr, true),
        (raw.stdout_excludes, Stream::Stdout, false),
        (raw.stderr_excludes, Stream::Stderr, false),
    ];
    predicates.extend(patterns.into_iter().filter_map(|(pattern, stream, wanted)| {
        pattern.map(|pattern| {
            if wanted {
                Predicate::matches(stream, pattern)
            } else {
                Predicate::not_matches(stream, pattern)
            }
        })
    }));

    let timeout = raw
        .timeout_secs
        .map(|secs| positive_secs(secs, "timeout_secs"))
        .transpose()
        .map_err(invalid)?
        .unwrap_or(default_timeout);

    let mut builder = Assertion::builder(descriptor).timeout(timeout);
    if let Some(name) = raw.name {
        builder = builder.name(name);
    }
    for predicate in predicates {
        builder = builder.should(predicate);
    }
    builder.build().map_err(|e| invalid(e.to_string()))
}

/// Keys like `directory = true` that only make sense when set.
fn flag(value: Option<bool>, key: &str, predicate: Predicate) -> Result<Option<Predicate>, String> {
    match value {
        None => Ok(None),
        Some(true) => Ok(Some(predicate)),
        Some(false) => Err(format!("'{key}' only accepts true")),
    }
}
