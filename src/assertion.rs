//! Assertions: one resource, one probe, several matchers.
//!
//! An [`Assertion`] is assembled with [`Assertion::builder`] (or one of the
//! shorthands) and validated when built, so running it never fails. Each run
//! walks a small state machine:
//!
//! ```text
//! Pending → Probing → ProbeFailed
//!                   → Evaluating → Passed | Failed
//! ```
//!
//! A probe error short-circuits evaluation; otherwise every matcher is
//! evaluated and the verdicts are ANDed.
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::SuiteError;
use crate::matchers::{CheckResult, Matcher, Predicate, Stream};
use crate::probes::{ObservedState, ProbeOptions, Prober, ResourceDescriptor};

/// Final verdict of an assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every matcher held.
    Passed,
    /// At least one matcher did not hold.
    Failed,
    /// The resource could not be observed.
    ProbeFailed,
    /// The engine itself misbehaved while running this assertion.
    InternalError,
}

impl Outcome {
    /// Whether this outcome counts as a pass.
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::ProbeFailed => write!(f, "probe failed"),
            Self::InternalError => write!(f, "internal error"),
        }
    }
}

/// Lifecycle of a single run, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Probing,
    Evaluating,
    Done(Outcome),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Probing => write!(f, "probing"),
            Self::Evaluating => write!(f, "evaluating"),
            Self::Done(outcome) => outcome.fmt(f),
        }
    }
}

struct Transitions<'a> {
    descriptor: &'a ResourceDescriptor,
    phase: Phase,
}

impl<'a> Transitions<'a> {
    const fn new(descriptor: &'a ResourceDescriptor) -> Self {
        Self {
            descriptor,
            phase: Phase::Pending,
        }
    }

    fn advance(&mut self, next: Phase) {
        tracing::debug!("{}: {} -> {next}", self.descriptor, self.phase);
        self.phase = next;
    }
}

/// Record of one assertion run. Built once by [`Assertion::run`] and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Optional label from the suite.
    pub name: Option<String>,
    /// The resource that was checked.
    pub descriptor: ResourceDescriptor,
    /// The expectations, in declaration order.
    pub predicates: Vec<Predicate>,
    /// Final verdict.
    pub outcome: Outcome,
    /// All failure messages, one per line; `None` on pass.
    pub message: Option<String>,
    /// Per-matcher verdicts; empty when the probe failed.
    pub checks: Vec<CheckResult>,
    /// Full observed state, when the probe succeeded.
    pub observed: Option<ObservedState>,
}

impl AssertionResult {
    /// Whether every predicate held.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.outcome.is_pass()
    }

    /// Result for an assertion whose run was aborted by an engine defect.
    pub(crate) fn internal_error(assertion: &Assertion, detail: &str) -> Self {
        Self {
            name: assertion.name.clone(),
            descriptor: assertion.descriptor.clone(),
            predicates: assertion.predicates(),
            outcome: Outcome::InternalError,
            message: Some(format!("{}: internal error: {detail}", assertion.descriptor)),
            checks: Vec::new(),
            observed: None,
        }
    }
}

/// A validated pairing of one resource with one or more matchers.
#[derive(Debug, Clone)]
pub struct Assertion {
    name: Option<String>,
    descriptor: ResourceDescriptor,
    matchers: Vec<Matcher>,
    options: ProbeOptions,
}

impl Assertion {
    /// Start building an assertion on `descriptor`.
    #[must_use]
    pub const fn builder(descriptor: ResourceDescriptor) -> AssertionBuilder {
        AssertionBuilder {
            name: None,
            descriptor,
            predicates: Vec::new(),
            timeout: None,
        }
    }

    /// Builder for a filesystem path.
    #[must_use]
    pub fn file(path: impl Into<String>) -> AssertionBuilder {
        Self::builder(ResourceDescriptor::file(path))
    }

    /// Builder for a path that must be a directory.
    #[must_use]
    pub fn directory(path: impl Into<String>) -> AssertionBuilder {
        Self::file(path).should(Predicate::IsDirectory)
    }

    /// Builder for a service.
    #[must_use]
    pub fn service(name: impl Into<String>) -> AssertionBuilder {
        Self::builder(ResourceDescriptor::service(name))
    }

    /// Builder for a command line.
    #[must_use]
    pub fn command(line: impl Into<String>) -> AssertionBuilder {
        Self::builder(ResourceDescriptor::command(line))
    }

    /// Optional label.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The resource under test.
    #[must_use]
    pub const fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Probe options applied to every run.
    #[must_use]
    pub const fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// The expectations in declaration order.
    #[must_use]
    pub fn predicates(&self) -> Vec<Predicate> {
        self.matchers.iter().map(|m| m.predicate().clone()).collect()
    }

    /// Probe the resource once and evaluate every matcher against it.
    pub fn run(&self, prober: &dyn Prober) -> AssertionResult {
        let mut phase = Transitions::new(&self.descriptor);
        phase.advance(Phase::Probing);

        let state = match prober.probe(&self.descriptor, &self.options) {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!("{}: {} error: {e}", self.descriptor, e.kind());
                phase.advance(Phase::Done(Outcome::ProbeFailed));
                return self.finish(
                    Outcome::ProbeFailed,
                    Some(format!("{}: probe failed: {e}", self.descriptor)),
                    Vec::new(),
                    None,
                );
            }
        };

        if state.kind() != self.descriptor.kind() {
            phase.advance(Phase::Done(Outcome::InternalError));
            return self.finish(
                Outcome::InternalError,
                Some(format!(
                    "{}: internal error: prober returned a {} state",
                    self.descriptor,
                    state.kind()
                )),
                Vec::new(),
                Some(state),
            );
        }

        phase.advance(Phase::Evaluating);
        let checks: Vec<CheckResult> = self
            .matchers
            .iter()
            .map(|m| m.evaluate(&self.descriptor, &state))
            .collect();

        let failures: Vec<&str> = checks.iter().filter_map(|c| c.message.as_deref()).collect();
        let (outcome, message) = if failures.is_empty() {
            (Outcome::Passed, None)
        } else {
            (Outcome::Failed, Some(failures.join("\n")))
        };
        phase.advance(Phase::Done(outcome));
        self.finish(outcome, message, checks, Some(state))
    }

    fn finish(
        &self,
        outcome: Outcome,
        message: Option<String>,
        checks: Vec<CheckResult>,
        observed: Option<ObservedState>,
    ) -> AssertionResult {
        AssertionResult {
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
            predicates: self.predicates(),
            outcome,
            message,
            checks,
            observed,
        }
    }
}

/// Collects predicates for an [`Assertion`].
///
/// # Examples
///
/// ```
/// use hostspec::assertion::Assertion;
/// use hostspec::matchers::Predicate;
///
/// let a = Assertion::command("echo 'Get-DSCConfiguration succeeded'")
///     .should(Predicate::Equals(0))
///     .stdout_matches("Get-DSCConfiguration succeeded")
///     .build()
///     .unwrap();
/// assert_eq!(a.predicates().len(), 2);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct AssertionBuilder {
    name: Option<String>,
    descriptor: ResourceDescriptor,
    predicates: Vec<Predicate>,
    timeout: Option<Duration>,
}

impl AssertionBuilder {
    /// Add an expectation.
    pub fn should(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Expect the resource to exist (or the service to be installed).
    pub fn exists(self) -> Self {
        self.should(Predicate::Exists)
    }

    /// Expect the resource to be absent (or the service not installed).
    pub fn not_exists(self) -> Self {
        self.should(Predicate::NotExists)
    }

    /// Expect stdout to contain a match for `pattern`.
    pub fn stdout_matches(self, pattern: impl Into<String>) -> Self {
        self.should(Predicate::matches(Stream::Stdout, pattern))
    }

    /// Label the assertion in reports.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the command timeout.
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Validate the predicates and compile their matchers.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::NoPredicates`] for an assertion without
    /// expectations, and any error from [`Matcher::compile`].
    pub fn build(self) -> Result<Assertion, SuiteError> {
        if self.predicates.is_empty() {
            return Err(SuiteError::NoPredicates {
                descriptor: self.descriptor.to_string(),
            });
        }
        let kind = self.descriptor.kind();
        let matchers = self
            .predicates
            .into_iter()
            .map(|p| Matcher::compile(p, kind))
            .collect::<Result<Vec<_>, _>>()?;
        let options = self
            .timeout
            .map_or_else(ProbeOptions::default, |timeout| ProbeOptions { timeout });
        Ok(Assertion {
            name: self.name,
            descriptor: self.descriptor,
            matchers,
            options,
        })
    }
}
