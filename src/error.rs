//! Suite-construction errors.
//!
//! Everything in this module is detected while a suite is being assembled,
//! before any probe runs. Command handlers at the CLI boundary convert these
//! into [`anyhow::Error`] and map them to exit code 2.
//!
//! Runtime failures live elsewhere: [`ProbeError`](crate::probes::ProbeError)
//! is folded into a failed assertion result, and a failed predicate is plain
//! data in the report.

use thiserror::Error;

use crate::probes::ResourceKind;

/// Errors that make a suite impossible to build.
#[derive(Error, Debug)]
pub enum SuiteError {
    /// A predicate was attached to a resource kind it cannot be checked on.
    #[error("predicate '{predicate}' cannot be applied to a {kind} resource")]
    IncompatiblePredicate {
        /// Description of the offending predicate.
        predicate: String,
        /// Kind of the resource it was attached to.
        kind: ResourceKind,
    },

    /// A regular expression failed to compile.
    #[error("invalid regex /{pattern}/: {reason}")]
    InvalidRegex {
        /// The pattern as written.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    /// An assertion was built without any predicate.
    #[error("assertion on {descriptor} has no expectations")]
    NoPredicates {
        /// Description of the resource.
        descriptor: String,
    },

    /// The suite file could not be read.
    #[error("cannot read suite file {path}: {source}")]
    Read {
        /// Path to the suite file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The suite file is not valid TOML or does not match the schema.
    #[error("invalid suite file {path}: {message}")]
    Parse {
        /// Path to the suite file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A single `[[assert]]` entry is malformed.
    #[error("assert #{index}: {reason}")]
    InvalidEntry {
        /// One-based position of the entry in the file.
        index: usize,
        /// Human-readable explanation.
        reason: String,
    },
}
