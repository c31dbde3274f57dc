//! Command-line interface definition.
use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::suite::Format;

/// Top-level CLI entry point for the host-state assertion engine.
#[derive(Parser, Debug)]
#[command(
    name = "hostspec",
    about = "Verify host state against a declarative suite of assertions",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Run assertions one at a time (overrides `parallel` in the suite)
    #[arg(long = "no-parallel", global = true)]
    pub no_parallel: bool,

    /// Also write a plain-text log, including debug events, to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a suite and report the results
    Run(RunOpts),
    /// Load and validate a suite without probing anything
    Check(CheckOpts),
    /// Print version information
    Version,
}

/// Options for the `run` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RunOpts {
    /// Suite file (TOML)
    pub suite: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Default command timeout in seconds (overrides the suite's settings)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<NonZeroU64>,

    /// Maximum number of assertions probed concurrently
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<NonZeroUsize>,
}

/// Options for the `check` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CheckOpts {
    /// Suite file (TOML)
    pub suite: PathBuf,
}
