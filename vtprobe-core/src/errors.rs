//! errors.rs - Custom error types for the vtprobe-core library.
//!
//! None of these are fatal to a probe run: the orchestrator logs them and
//! moves on to the next sequence or phase. They exist so callers that drive
//! the recorder or the report writer directly can react programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// All error types produced by the `vtprobe-core` library.
///
/// `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VtprobeError {
    #[error("Sink '{0}' is unavailable: {1}")]
    SinkUnavailable(String, std::io::Error),

    #[error("Finding for sequence '{0}' has no matching test record in this run")]
    OrphanFinding(String),

    #[error("Invalid generator limits: {0}")]
    InvalidLimits(String),

    #[error("Failed to render report: {0}")]
    ReportRender(String),
}
