//! Suite execution.
//!
//! Assertions are independent: each one probes its own resource and a panic
//! inside one is caught and recorded without disturbing the others. Results
//! are always reported in declaration order, whether the suite ran
//! sequentially or on a worker pool.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use super::report::SuiteReport;
use super::Suite;
use crate::assertion::{Assertion, AssertionResult};
use crate::probes::Prober;

/// Runs every assertion of a suite and aggregates the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteRunner {
    parallel: bool,
    jobs: Option<usize>,
}

impl SuiteRunner {
    /// A sequential runner.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parallel: false,
            jobs: None,
        }
    }

    /// Enable or disable concurrent execution.
    #[must_use]
    pub const fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Bound the worker pool; `None` uses rayon's default.
    #[must_use]
    pub const fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Run every assertion in `suite` against `prober`.
    ///
    /// Never fails: probe errors and panics become failed results.
    pub fn run(&self, suite: &Suite, prober: &dyn Prober) -> SuiteReport {
        let assertions = suite.assertions();
        tracing::debug!(
            "running {} assertions ({})",
            assertions.len(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        let results = if self.parallel && assertions.len() > 1 {
            self.run_parallel(assertions, prober)
        } else {
            assertions.iter().map(|a| run_isolated(a, prober)).collect()
        };
        SuiteReport::new(results)
    }

    fn run_parallel(&self, assertions: &[Assertion], prober: &dyn Prober) -> Vec<AssertionResult> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .thread_name(|i| format!("hostspec-worker-{i}"))
            .build();
        match pool {
            Ok(pool) => pool.install(|| {
                assertions
                    .par_iter()
                    .map(|a| run_isolated(a, prober))
                    .collect()
            }),
            Err(e) => {
                tracing::warn!("worker pool unavailable ({e}); running sequentially");
                assertions.iter().map(|a| run_isolated(a, prober)).collect()
            }
        }
    }
}

/// Run one assertion, converting a panic into an internal-error result.
fn run_isolated(assertion: &Assertion, prober: &dyn Prober) -> AssertionResult {
    panic::catch_unwind(AssertUnwindSafe(|| assertion.run(prober))).unwrap_or_else(|payload| {
        let detail = panic_message(payload.as_ref());
        tracing::error!("{}: panicked: {detail}", assertion.descriptor());
        AssertionResult::internal_error(assertion, &detail)
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string())
}
