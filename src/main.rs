//! `hostspec` command-line entry point.
use std::io::{self, Write as _};
use std::process::ExitCode;

use clap::Parser;

use hostspec::cli::{Cli, Command};
use hostspec::commands::{self, EXIT_CONFIG_ERROR};
use hostspec::logging::{self, Logger};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if let Err(e) = logging::init_subscriber(args.verbose, args.global.log_file.as_deref()) {
        let _ = writeln!(io::stderr(), "error: cannot open log file: {e}");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }
    let log = Logger::new(args.global.log_file.as_deref());

    let result = match &args.command {
        Command::Run(opts) => commands::run::run(&args.global, opts, &log),
        Command::Check(opts) => commands::check::run(opts, &log),
        Command::Version => commands::version::run(),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}
