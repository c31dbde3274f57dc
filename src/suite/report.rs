//! Aggregated suite results and their text/JSON renderings.
use std::fmt::Write as _;
use std::io;

use serde::Serialize;

use crate::assertion::{AssertionResult, Outcome};
use crate::probes::{ObservedState, ResourceDescriptor};

/// Output format of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// One line per assertion, failure messages indented below, summary last.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

/// Pass/fail counts over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of assertions run.
    pub total: usize,
    /// Assertions whose predicates all held.
    pub passed: usize,
    /// Everything else: failed predicates, probe failures, internal errors.
    pub failed: usize,
}

/// Results of a suite run, in declaration order. Frozen once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    results: Vec<AssertionResult>,
    summary: Summary,
}

impl SuiteReport {
    /// Freeze `results`; the summary is computed here, after every
    /// assertion has run.
    pub(crate) fn new(results: Vec<AssertionResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed()).count();
        let summary = Summary {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        };
        Self { results, summary }
    }

    /// Per-assertion results.
    #[must_use]
    pub fn results(&self) -> &[AssertionResult] {
        &self.results
    }

    /// Aggregate counts.
    #[must_use]
    pub const fn summary(&self) -> Summary {
        self.summary
    }

    /// Whether every assertion passed.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    /// Process exit code: 0 when everything passed, 1 otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.all_passed() { 0 } else { 1 }
    }

    /// Render in `format`.
    ///
    /// # Errors
    ///
    /// Returns an error only if JSON serialization fails.
    pub fn render(&self, format: Format) -> serde_json::Result<String> {
        match format {
            Format::Text => Ok(self.render_text()),
            Format::Json => self.render_json(),
        }
    }

    /// Write the rendering to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_to(&self, format: Format, out: &mut dyn io::Write) -> io::Result<()> {
        let rendered = self.render(format).map_err(io::Error::other)?;
        out.write_all(rendered.as_bytes())?;
        out.flush()
    }

    /// Human-readable rendering.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            let icon = if result.passed() { "✓" } else { "✗" };
            let _ = write!(out, "{icon} {}", label(result));
            match result.outcome {
                Outcome::Passed | Outcome::Failed => {}
                tagged @ (Outcome::ProbeFailed | Outcome::InternalError) => {
                    let _ = write!(out, " [{tagged}]");
                }
            }
            out.push('\n');
            if let Some(message) = &result.message {
                for line in message.lines() {
                    let _ = writeln!(out, "    {line}");
                }
            }
        }
        let Summary {
            total,
            passed,
            failed,
        } = self.summary;
        let _ = writeln!(
            out,
            "{total} assertions, {passed} passed, {failed} failed"
        );
        out
    }

    /// Machine-readable rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_json(&self) -> serde_json::Result<String> {
        let doc = JsonReport {
            summary: self.summary,
            results: self.results.iter().map(JsonResult::from).collect(),
        };
        let mut s = serde_json::to_string_pretty(&doc)?;
        s.push('\n');
        Ok(s)
    }
}

/// `name` if given, otherwise the descriptor, followed by the expectations.
fn label(result: &AssertionResult) -> String {
    let kind = result.descriptor.kind();
    let expectations = result
        .predicates
        .iter()
        .map(|p| p.describe(kind))
        .collect::<Vec<_>>()
        .join(", ");
    match &result.name {
        Some(name) => format!("{name}: {expectations}"),
        None => format!("{} {expectations}", result.descriptor),
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    results: Vec<JsonResult<'a>>,
}

#[derive(Serialize)]
struct JsonResult<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    descriptor: &'a ResourceDescriptor,
    predicates: Vec<String>,
    outcome: Outcome,
    passed: bool,
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    observed: Option<&'a ObservedState>,
}

impl<'a> From<&'a AssertionResult> for JsonResult<'a> {
    fn from(r: &'a AssertionResult) -> Self {
        let kind = r.descriptor.kind();
        Self {
            name: r.name.as_deref(),
            descriptor: &r.descriptor,
            predicates: r.predicates.iter().map(|p| p.describe(kind)).collect(),
            outcome: r.outcome,
            passed: r.passed(),
            message: r.message.as_deref(),
            observed: r.observed.as_ref(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::matchers::{Predicate, Stream};

    fn result(
        descriptor: ResourceDescriptor,
        predicates: Vec<Predicate>,
        outcome: Outcome,
        message: Option<&str>,
    ) -> AssertionResult {
        AssertionResult {
            name: None,
            descriptor,
            predicates,
            outcome,
            message: message.map(String::from),
            checks: Vec::new(),
            observed: None,
        }
    }

    fn sample() -> SuiteReport {
        let mut named = result(
            ResourceDescriptor::command("Get-DSCConfiguration"),
            vec![
                Predicate::Equals(0),
                Predicate::matches(Stream::Stdout, "Get-DSCConfiguration succeeded"),
            ],
            Outcome::Failed,
            Some(
                "command 'Get-DSCConfiguration': expected stdout to match /Get-DSCConfiguration succeeded/, but stdout was \"Get-DSCConfiguration failed\"",
            ),
        );
        named.name = Some("DSC configuration can be read".to_string());
        SuiteReport::new(vec![
            result(
                ResourceDescriptor::file("c:/Octopus"),
                vec![Predicate::IsDirectory],
                Outcome::Passed,
                None,
            ),
            result(
                ResourceDescriptor::service("OctopusDeploy Tentacle"),
                vec![Predicate::NotExists],
                Outcome::ProbeFailed,
                Some("service 'OctopusDeploy Tentacle': probe failed: systemctl unavailable: not found on PATH"),
            ),
            named,
        ])
    }

    #[test]
    fn summary_is_computed_from_results() {
        let report = sample();
        assert_eq!(
            report.summary(),
            Summary {
                total: 3,
                passed: 1,
                failed: 2
            }
        );
        assert!(!report.all_passed());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn all_passed_exits_zero() {
        let report = SuiteReport::new(vec![result(
            ResourceDescriptor::file("c:/Octopus"),
            vec![Predicate::IsDirectory],
            Outcome::Passed,
            None,
        )]);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn text_rendering() {
        insta::assert_snapshot!(sample().render_text(), @r#"
        ✓ file 'c:/Octopus' to be a directory
        ✗ service 'OctopusDeploy Tentacle' not to be installed [probe failed]
            service 'OctopusDeploy Tentacle': probe failed: systemctl unavailable: not found on PATH
        ✗ DSC configuration can be read: exit status to eq 0, stdout to match /Get-DSCConfiguration succeeded/
            command 'Get-DSCConfiguration': expected stdout to match /Get-DSCConfiguration succeeded/, but stdout was "Get-DSCConfiguration failed"
        3 assertions, 1 passed, 2 failed
        "#);
    }

    #[test]
    fn json_rendering_has_summary_and_results() {
        let json: serde_json::Value =
            serde_json::from_str(&sample().render_json().unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 3);
        assert_eq!(json["summary"]["failed"], 2);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["descriptor"]["kind"], "file");
        assert_eq!(results[0]["passed"], true);
        assert!(results[0]["message"].is_null());
        assert_eq!(results[1]["outcome"], "probe_failed");
        assert_eq!(results[1]["predicates"][0], "not to be installed");
        assert_eq!(results[2]["name"], "DSC configuration can be read");
    }

    #[test]
    fn write_to_emits_rendering() {
        let mut buf = Vec::new();
        sample().write_to(Format::Text, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("3 assertions, 1 passed, 2 failed\n"));
    }
}
