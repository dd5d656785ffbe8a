//! Error metadata shared across crates
//!
//! Each crate defines its own `thiserror` enum. The ones that reach the batch
//! runner implement [`ErrorMetadata`] so a failure can be logged at the right
//! level and tagged with a stable, machine-readable code.

use std::error::Error;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected conditions
    Debug,
    /// Warning level - for recoverable issues (the file stays in the inbox)
    Warn,
    /// Error level - for failures that leave storage or warehouse inconsistent
    Error,
}

/// Describes how an error should be reported
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "EXTRACTION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether re-running the batch is expected to succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Render an error together with its source chain.
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut details = err.to_string();

    let mut source = err.source();
    let mut depth = 0;
    while let Some(inner) = source {
        depth += 1;
        if depth > 5 {
            details.push_str(": ... (truncated)");
            break;
        }
        details.push_str(&format!(": {}", inner));
        source = inner.source();
    }

    details
}
