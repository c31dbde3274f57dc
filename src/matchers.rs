//! Predicates and the compiled matchers that check them.
//!
//! A [`Predicate`] is the declarative expectation written in a suite. A
//! [`Matcher`] is that predicate after suite-construction checks: it is known
//! to apply to the resource kind it is attached to, and any regex has been
//! compiled. Evaluating a matcher never fails; it yields a [`CheckResult`].
use std::fmt;

use regex::Regex;
use serde::Serialize;

use crate::error::SuiteError;
use crate::probes::{ObservedState, ResourceDescriptor, ResourceKind};

/// Longest slice of captured output quoted in a failure message.
pub const MAX_MESSAGE_OUTPUT: usize = 2048;

/// Which captured stream a regex predicate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// A named condition on an observed state.
///
/// # Examples
///
/// ```
/// use hostspec::matchers::{Predicate, Stream};
/// use hostspec::probes::ResourceKind;
///
/// assert!(Predicate::IsDirectory.applies_to(ResourceKind::File));
/// assert!(!Predicate::Equals(0).applies_to(ResourceKind::Service));
///
/// let p = Predicate::matches(Stream::Stdout, "succeeded");
/// assert_eq!(p.describe(ResourceKind::Command), "stdout to match /succeeded/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// The file exists / the service is installed.
    Exists,
    /// The file does not exist / the service is not installed.
    NotExists,
    /// The path exists and is a directory.
    IsDirectory,
    /// The path exists and is not a directory.
    IsFile,
    /// The command's exit status equals the value.
    Equals(i32),
    /// The stream contains a match for the pattern (unanchored).
    MatchesRegex {
        /// Stream to search.
        stream: Stream,
        /// Pattern in `regex` crate syntax.
        pattern: String,
    },
    /// The stream contains no match for the pattern.
    NotMatchesRegex {
        /// Stream to search.
        stream: Stream,
        /// Pattern in `regex` crate syntax.
        pattern: String,
    },
}

impl Predicate {
    /// Shorthand for [`Predicate::MatchesRegex`].
    #[must_use]
    pub fn matches(stream: Stream, pattern: impl Into<String>) -> Self {
        Self::MatchesRegex {
            stream,
            pattern: pattern.into(),
        }
    }

    /// Shorthand for [`Predicate::NotMatchesRegex`].
    #[must_use]
    pub fn not_matches(stream: Stream, pattern: impl Into<String>) -> Self {
        Self::NotMatchesRegex {
            stream,
            pattern: pattern.into(),
        }
    }

    /// Whether this predicate can be checked against a resource of `kind`.
    #[must_use]
    pub const fn applies_to(&self, kind: ResourceKind) -> bool {
        match self {
            Self::Exists | Self::NotExists => {
                matches!(kind, ResourceKind::File | ResourceKind::Service)
            }
            Self::IsDirectory | Self::IsFile => matches!(kind, ResourceKind::File),
            Self::Equals(_) | Self::MatchesRegex { .. } | Self::NotMatchesRegex { .. } => {
                matches!(kind, ResourceKind::Command)
            }
        }
    }

    /// Phrase used after "expected" in reports, worded for `kind`.
    #[must_use]
    pub fn describe(&self, kind: ResourceKind) -> String {
        match (self, kind) {
            (Self::Exists, ResourceKind::Service) => "to be installed".to_string(),
            (Self::NotExists, ResourceKind::Service) => "not to be installed".to_string(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => write!(f, "to exist"),
            Self::NotExists => write!(f, "not to exist"),
            Self::IsDirectory => write!(f, "to be a directory"),
            Self::IsFile => write!(f, "to be a file"),
            Self::Equals(n) => write!(f, "exit status to eq {n}"),
            Self::MatchesRegex { stream, pattern } => write!(f, "{stream} to match /{pattern}/"),
            Self::NotMatchesRegex { stream, pattern } => {
                write!(f, "{stream} not to match /{pattern}/")
            }
        }
    }
}

/// Verdict of one matcher against one observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// The predicate that was checked.
    pub predicate: Predicate,
    /// Whether it held.
    pub passed: bool,
    /// Failure explanation; `None` when the check passed.
    pub message: Option<String>,
}

/// A predicate validated for a resource kind, with its regex compiled.
#[derive(Debug, Clone)]
pub struct Matcher {
    predicate: Predicate,
    regex: Option<Regex>,
}

impl Matcher {
    /// Validate `predicate` against `kind` and compile any pattern.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::IncompatiblePredicate`] if the predicate cannot
    /// be checked on `kind`, or [`SuiteError::InvalidRegex`] if the pattern
    /// does not compile.
    pub fn compile(predicate: Predicate, kind: ResourceKind) -> Result<Self, SuiteError> {
        if !predicate.applies_to(kind) {
            return Err(SuiteError::IncompatiblePredicate {
                predicate: predicate.describe(kind),
                kind,
            });
        }
        let regex = match &predicate {
            Predicate::MatchesRegex { pattern, .. } | Predicate::NotMatchesRegex { pattern, .. } => {
                Some(Regex::new(pattern).map_err(|e| SuiteError::InvalidRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?)
            }
            _ => None,
        };
        Ok(Self { predicate, regex })
    }

    /// The predicate this matcher checks.
    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Check the predicate against `state`, observed from `descriptor`.
    #[must_use]
    pub fn evaluate(&self, descriptor: &ResourceDescriptor, state: &ObservedState) -> CheckResult {
        let verdict = self.verdict(state);
        let message = match verdict {
            Ok(()) => None,
            Err(actual) => Some(format!(
                "{descriptor}: expected {}, but {actual}",
                self.predicate.describe(descriptor.kind())
            )),
        };
        CheckResult {
            predicate: self.predicate.clone(),
            passed: message.is_none(),
            message,
        }
    }

    /// `Ok(())` when the predicate holds, otherwise a description of what was
    /// actually observed.
    fn verdict(&self, state: &ObservedState) -> Result<(), String> {
        match (&self.predicate, state) {
            (Predicate::Exists, ObservedState::File { exists, .. }) => {
                require(*exists, || "it does not exist".to_string())
            }
            (Predicate::NotExists, ObservedState::File { exists, is_directory }) => {
                require(!*exists, || {
                    if *is_directory {
                        "a directory exists there".to_string()
                    } else {
                        "a file exists there".to_string()
                    }
                })
            }
            (Predicate::IsDirectory, ObservedState::File { exists, is_directory }) => {
                require(*exists && *is_directory, || describe_entry(*exists))
            }
            (Predicate::IsFile, ObservedState::File { exists, is_directory }) => {
                require(*exists && !*is_directory, || {
                    if *exists {
                        "it is a directory".to_string()
                    } else {
                        "it does not exist".to_string()
                    }
                })
            }
            (Predicate::Exists, ObservedState::Service { installed }) => {
                require(*installed, || "it is not installed".to_string())
            }
            (Predicate::NotExists, ObservedState::Service { installed }) => {
                require(!*installed, || "it is installed".to_string())
            }
            (Predicate::Equals(expected), ObservedState::Command { exit_status, .. }) => {
                require(exit_status == expected, || {
                    format!("exit status was {exit_status}")
                })
            }
            (
                Predicate::MatchesRegex { stream, .. },
                ObservedState::Command { stdout, stderr, .. },
            ) => {
                let text = select(*stream, stdout, stderr);
                require(self.is_match(text), || quote_stream(*stream, text))
            }
            (
                Predicate::NotMatchesRegex { stream, .. },
                ObservedState::Command { stdout, stderr, .. },
            ) => {
                let text = select(*stream, stdout, stderr);
                require(!self.is_match(text), || quote_stream(*stream, text))
            }
            (predicate, state) => Err(format!(
                "a {} state was observed, which '{predicate}' cannot check",
                state.kind()
            )),
        }
    }

    fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }
}

fn require(holds: bool, actual: impl FnOnce() -> String) -> Result<(), String> {
    if holds { Ok(()) } else { Err(actual()) }
}

fn describe_entry(exists: bool) -> String {
    if exists {
        "it is not a directory".to_string()
    } else {
        "it does not exist".to_string()
    }
}

const fn select<'a>(stream: Stream, stdout: &'a str, stderr: &'a str) -> &'a str {
    match stream {
        Stream::Stdout => stdout,
        Stream::Stderr => stderr,
    }
}

fn quote_stream(stream: Stream, text: &str) -> String {
    if text.is_empty() {
        format!("{stream} was empty")
    } else {
        format!("{stream} was {:?}", truncate(text, MAX_MESSAGE_OUTPUT))
    }
}

/// Cut `text` to at most `max` bytes on a char boundary, noting how much was
/// dropped.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = text.get(..end).unwrap_or_default();
    format!("{head}… ({} more bytes)", text.len() - end)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file_state(exists: bool, is_directory: bool) -> ObservedState {
        ObservedState::File {
            exists,
            is_directory,
        }
    }

    fn command_state(exit_status: i32, stdout: &str, stderr: &str) -> ObservedState {
        ObservedState::Command {
            exit_status,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    fn check(predicate: Predicate, descriptor: &ResourceDescriptor, state: &ObservedState) -> CheckResult {
        Matcher::compile(predicate, descriptor.kind())
            .unwrap()
            .evaluate(descriptor, state)
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn exit_status_on_file_is_rejected() {
        let err = Matcher::compile(Predicate::Equals(0), ResourceKind::File).unwrap_err();
        assert!(matches!(err, SuiteError::IncompatiblePredicate { .. }));
    }

    #[test]
    fn directory_on_service_is_rejected() {
        let err = Matcher::compile(Predicate::IsDirectory, ResourceKind::Service).unwrap_err();
        assert!(matches!(
            err,
            SuiteError::IncompatiblePredicate {
                kind: ResourceKind::Service,
                ..
            }
        ));
    }

    #[test]
    fn exists_on_command_is_rejected() {
        assert!(Matcher::compile(Predicate::Exists, ResourceKind::Command).is_err());
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = Matcher::compile(
            Predicate::matches(Stream::Stdout, "(unclosed"),
            ResourceKind::Command,
        )
        .unwrap_err();
        assert!(matches!(err, SuiteError::InvalidRegex { .. }));
    }

    // -----------------------------------------------------------------------
    // File predicates
    // -----------------------------------------------------------------------

    #[test]
    fn directory_passes_on_directory() {
        let d = ResourceDescriptor::file("c:/Octopus");
        let r = check(Predicate::IsDirectory, &d, &file_state(true, true));
        assert!(r.passed);
        assert!(r.message.is_none());
    }

    #[test]
    fn directory_fails_on_missing_path() {
        let d = ResourceDescriptor::file("c:/Octopus");
        let r = check(Predicate::IsDirectory, &d, &file_state(false, false));
        assert!(!r.passed);
        assert_eq!(
            r.message.as_deref(),
            Some("file 'c:/Octopus': expected to be a directory, but it does not exist")
        );
    }

    #[test]
    fn directory_fails_on_regular_file() {
        let d = ResourceDescriptor::file("c:/Octopus");
        let r = check(Predicate::IsDirectory, &d, &file_state(true, false));
        assert!(r.message.unwrap().contains("it is not a directory"));
    }

    #[test]
    fn not_exists_passes_on_absent_file() {
        let d = ResourceDescriptor::file("C:/Program Files/Octopus Deploy/Tentacle/Tentacle.exe");
        assert!(check(Predicate::NotExists, &d, &file_state(false, false)).passed);
    }

    #[test]
    fn not_exists_fails_on_present_file() {
        let d = ResourceDescriptor::file("/opt/tentacle");
        let r = check(Predicate::NotExists, &d, &file_state(true, false));
        assert!(!r.passed);
        assert!(r.message.unwrap().contains("a file exists there"));
    }

    #[test]
    fn is_file_fails_on_directory() {
        let d = ResourceDescriptor::file("/etc");
        let r = check(Predicate::IsFile, &d, &file_state(true, true));
        assert!(r.message.unwrap().contains("it is a directory"));
    }

    // -----------------------------------------------------------------------
    // Service predicates
    // -----------------------------------------------------------------------

    #[test]
    fn not_installed_passes_on_uninstalled_service() {
        let d = ResourceDescriptor::service("OctopusDeploy Tentacle");
        let r = check(
            Predicate::NotExists,
            &d,
            &ObservedState::Service { installed: false },
        );
        assert!(r.passed);
    }

    #[test]
    fn not_installed_message_uses_service_wording() {
        let d = ResourceDescriptor::service("OctopusDeploy Tentacle");
        let r = check(
            Predicate::NotExists,
            &d,
            &ObservedState::Service { installed: true },
        );
        assert_eq!(
            r.message.as_deref(),
            Some(
                "service 'OctopusDeploy Tentacle': expected not to be installed, but it is installed"
            )
        );
    }

    // -----------------------------------------------------------------------
    // Command predicates
    // -----------------------------------------------------------------------

    #[test]
    fn equals_compares_exit_status_exactly() {
        let d = ResourceDescriptor::command("exit 1");
        assert!(check(Predicate::Equals(1), &d, &command_state(1, "", "")).passed);
        let r = check(Predicate::Equals(0), &d, &command_state(1, "", ""));
        assert!(!r.passed);
        assert!(r.message.unwrap().contains("exit status was 1"));
    }

    #[test]
    fn regex_is_unanchored_containment() {
        let d = ResourceDescriptor::command("Get-DSCConfiguration");
        let state = command_state(0, "noise\nGet-DSCConfiguration succeeded\nmore", "");
        assert!(check(Predicate::matches(Stream::Stdout, "DSCConfiguration succ"), &d, &state).passed);
    }

    #[test]
    fn regex_selects_stream() {
        let d = ResourceDescriptor::command("x");
        let state = command_state(0, "out", "warning: deprecated");
        assert!(check(Predicate::matches(Stream::Stderr, "^warning"), &d, &state).passed);
        assert!(!check(Predicate::matches(Stream::Stdout, "warning"), &d, &state).passed);
    }

    #[test]
    fn regex_failure_names_pattern_and_output() {
        let d = ResourceDescriptor::command("x");
        let state = command_state(0, "Get-DSCConfiguration failed", "");
        let r = check(
            Predicate::matches(Stream::Stdout, "Get-DSCConfiguration succeeded"),
            &d,
            &state,
        );
        let message = r.message.unwrap();
        assert!(message.contains("/Get-DSCConfiguration succeeded/"), "{message}");
        assert!(message.contains("\"Get-DSCConfiguration failed\""), "{message}");
    }

    #[test]
    fn regex_failure_on_empty_stream() {
        let d = ResourceDescriptor::command("x");
        let r = check(Predicate::matches(Stream::Stdout, "a"), &d, &command_state(0, "", ""));
        assert!(r.message.unwrap().ends_with("stdout was empty"));
    }

    #[test]
    fn not_matches_fails_when_pattern_found() {
        let d = ResourceDescriptor::command("x");
        let state = command_state(0, "", "ERROR: boom");
        assert!(!check(Predicate::not_matches(Stream::Stderr, "ERROR"), &d, &state).passed);
        assert!(check(Predicate::not_matches(Stream::Stdout, "ERROR"), &d, &state).passed);
    }

    #[test]
    fn long_output_is_truncated_in_message() {
        let d = ResourceDescriptor::command("x");
        let long = "y".repeat(10_000);
        let r = check(
            Predicate::matches(Stream::Stdout, "z"),
            &d,
            &command_state(0, &long, ""),
        );
        let message = r.message.unwrap();
        assert!(message.len() < 3_000, "message was {} bytes", message.len());
        assert!(message.contains("(7952 more bytes)"), "{message}");
    }

    // -----------------------------------------------------------------------
    // Mismatched state
    // -----------------------------------------------------------------------

    #[test]
    fn mismatched_state_never_passes() {
        let d = ResourceDescriptor::file("/tmp");
        let m = Matcher::compile(Predicate::Exists, ResourceKind::File).unwrap();
        let r = m.evaluate(&d, &command_state(0, "", ""));
        assert!(!r.passed);
    }

    // -----------------------------------------------------------------------
    // truncate
    // -----------------------------------------------------------------------

    #[test]
    fn truncate_short_text_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "ééé"; // 6 bytes
        assert_eq!(truncate(s, 3), "é… (4 more bytes)");
    }
}
