//! Host-state assertion engine.
//!
//! Declares what a machine should look like (paths that must or must not
//! exist, services that must not be registered, commands whose exit status
//! and output must match) and checks it read-only against the live host.
//!
//! The public API is organised into layers:
//!
//! - **[`probes`]**: observe a file, service or command and return its state
//! - **[`matchers`]**: predicates compiled against a resource kind
//! - **[`assertion`]**: one resource plus its matchers, run once
//! - **[`suite`]**: TOML loading, the (optionally parallel) runner, and reports
//! - **[`commands`]**: top-level subcommand orchestration (`run`, `check`)
//!
//! ```
//! use hostspec::assertion::Assertion;
//! use hostspec::probes::HostProber;
//! use hostspec::suite::{Suite, SuiteRunner};
//!
//! let dir = std::env::temp_dir();
//! let suite = Suite::new()
//!     .with(Assertion::directory(dir.to_string_lossy()).build().unwrap())
//!     .with(Assertion::file("/definitely/not/here.exe").not_exists().build().unwrap());
//!
//! let report = SuiteRunner::new().run(&suite, &HostProber::new());
//! assert_eq!(report.summary().passed, 2);
//! assert_eq!(report.exit_code(), 0);
//! ```
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod assertion;
pub mod cli;
pub mod commands;
pub mod error;
pub mod exec;
pub mod logging;
pub mod matchers;
pub mod platform;
pub mod probes;
pub mod suite;
