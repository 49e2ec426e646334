// vtprobe-core/src/lib.rs
//! # VTProbe Core Library
//!
//! `vtprobe-core` generates terminal escape sequences from a catalog of known
//! commands, classifies each one against a fixed set of security hazards, and
//! records every test case and finding to append-only logs. A finished run is
//! condensed into a summary report.
//!
//! Generated sequences are never written to a terminal. They are data only:
//! every byte that reaches a log file goes through [`escape_sequence`] first.
//!
//! ## Modules
//!
//! * `sequence`: The `Sequence` value, its `Category` and generation `Origin`.
//! * `catalog`: Built-in tables of control characters, CSI, SGR, OSC and DEC private modes.
//! * `generator`: Turns catalog entries into test sequences, one phase per category.
//! * `classifier`: Maps a sequence to zero or more hazard labels.
//! * `recorder`: Test and vulnerability logs plus their file sinks.
//! * `report`: Builds and renders the run summary.
//! * `orchestrator`: Runs the phases in order and writes the report.
//! * `observer`: Progress callbacks for front ends.
//! * `config`: `ProbeConfig`, loaded from YAML.
//! * `errors`: The crate error type.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use vtprobe_core::{run_probe, Catalog, ProbeConfig, SilentObserver};
//!
//! let config = ProbeConfig { seed: Some(42), ..ProbeConfig::default() }.with_output_dir("probe-out");
//! let outcome = run_probe(&Catalog::standard(), &config, Box::new(SilentObserver));
//! println!(
//!     "{} tests, {} vulnerabilities",
//!     outcome.summary.total_tests, outcome.summary.total_vulnerabilities
//! );
//! ```
//!
//! ## Error Handling
//!
//! Configuration loading returns `anyhow::Result` with context. Everything the
//! run itself can hit is a [`VtprobeError`]; none of those abort a run. Sink
//! failures disable the sink, orphan findings are skipped, and both are logged
//! through `log`.
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod generator;
pub mod observer;
pub mod orchestrator;
pub mod recorder;
pub mod report;
pub mod sequence;

/// Re-exports the sequence value types.
pub use sequence::{escape_sequence, Category, Origin, ParseCategoryError, Sequence};

/// Re-exports the catalog.
pub use catalog::{Catalog, CatalogSizes, KnownPayload};

/// Re-exports the classifier entry point and its label type.
pub use classifier::{classify, HazardLabel};

/// Re-exports configuration types.
pub use config::{GeneratorLimits, OutputConfig, ProbeConfig, ReportFormat};

/// Re-exports the custom error type for clear error reporting.
pub use errors::VtprobeError;

/// Re-exports observer types.
pub use observer::{LogObserver, RunObserver, SilentObserver};

/// Re-exports the run entry points.
pub use orchestrator::{run_passthrough, run_probe, Orchestrator, RunOutcome, RunState};

/// Re-exports record and sink types.
pub use recorder::{
    Clock, FixedClock, Recorder, RunCounts, RunLog, RunSinks, Sink, SinkPaths, SystemClock,
    TestRecord, VulnerabilityRecord,
};

/// Re-exports report types.
pub use report::{synthesize, RunSummary};
