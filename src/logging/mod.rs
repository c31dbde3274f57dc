//! Logging infrastructure for console and file output.

mod logger;
mod subscriber;
mod utils;

pub use logger::Logger;
pub use subscriber::init_subscriber;

/// Target for stage headers; rendered as `==>` lines.
pub(crate) const STAGE_TARGET: &str = "hostspec::stage";
