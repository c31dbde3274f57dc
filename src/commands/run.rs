//! Command: run a suite against the host.
use std::fs;
use std::io;
use std::num::{NonZeroU64, NonZeroUsize};
use std::time::Duration;

use anyhow::{Context as _, Result};

use crate::cli::{GlobalOpts, RunOpts};
use crate::logging::Logger;
use crate::platform::Platform;
use crate::probes::{HostProber, Prober};
use crate::suite::{SuiteReport, SuiteRunner};

/// Run the suite in `opts` and emit the report.
///
/// Returns [`EXIT_OK`](super::EXIT_OK) when every assertion passed and
/// [`EXIT_FAILED`](super::EXIT_FAILED) otherwise.
///
/// # Errors
///
/// Returns an error if the suite cannot be loaded or the report cannot be
/// written.
pub fn run(global: &GlobalOpts, opts: &RunOpts, log: &Logger) -> Result<u8> {
    run_with(global, opts, log, &HostProber::new())
}

/// [`run`] with a caller-supplied prober.
///
/// # Errors
///
/// Same as [`run`].
pub fn run_with(
    global: &GlobalOpts,
    opts: &RunOpts,
    log: &Logger,
    prober: &dyn Prober,
) -> Result<u8> {
    let timeout = opts.timeout.map(NonZeroU64::get).map(Duration::from_secs);
    let suite = super::load_suite(&opts.suite, timeout, log)?;

    let settings = suite.settings();
    let parallel = !global.no_parallel && settings.parallel;
    let jobs = opts.jobs.map(NonZeroUsize::get).or(settings.jobs);
    if !parallel && opts.jobs.is_some() {
        log.warn("--jobs has no effect while parallel execution is disabled");
    }
    let runner = SuiteRunner::new().parallel(parallel).jobs(jobs);

    log.stage("Probing host");
    log.debug(&format!("platform: {}", Platform::detect().os));
    let report = runner.run(&suite, prober);

    emit(&report, opts, log)?;
    Ok(report.exit_code())
}

fn emit(report: &SuiteReport, opts: &RunOpts, log: &Logger) -> Result<()> {
    match &opts.output {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("failed to create report file {}", path.display()))?;
            report
                .write_to(opts.format, &mut file)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            log.print_summary(report);
            log.info(&format!("report: {}", path.display()));
        }
        None => {
            report
                .write_to(opts.format, &mut io::stdout().lock())
                .context("failed to write report to stdout")?;
        }
    }
    Ok(())
}
