// vtprobe-core/src/observer.rs
//! Progress notifications for a probe run.
//!
//! The core never prints. Front ends that want console output implement
//! [`RunObserver`]; the default [`LogObserver`] forwards everything to the
//! `log` facade.

use log::{info, warn};

use crate::recorder::VulnerabilityRecord;
use crate::sequence::Category;

/// Receives progress events from the orchestrator and recorder.
pub trait RunObserver {
    /// A phase is about to generate `planned` sequences.
    fn phase_started(&mut self, _category: Category, _planned: usize) {}

    /// A phase was disabled by configuration and passed through.
    fn phase_skipped(&mut self, _category: Category) {}

    /// A vulnerability record was appended.
    fn vulnerability_found(&mut self, _record: &VulnerabilityRecord) {}

    /// A phase recorded `tests` test records and `vulnerabilities` findings.
    fn phase_finished(&mut self, _category: Category, _tests: usize, _vulnerabilities: usize) {}
}

/// Observer that reports through `log`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn phase_started(&mut self, category: Category, planned: usize) {
        info!("Testing {} ({} sequences)...", category.title().to_lowercase(), planned);
    }

    fn phase_skipped(&mut self, category: Category) {
        info!("Skipping {} (disabled by configuration).", category.title().to_lowercase());
    }

    fn vulnerability_found(&mut self, record: &VulnerabilityRecord) {
        warn!("[!] Vulnerability found: {} - {}", record.label, record.sequence.escaped());
    }

    fn phase_finished(&mut self, category: Category, tests: usize, vulnerabilities: usize) {
        info!(
            "Finished {}: {} tests, {} vulnerabilities.",
            category.title().to_lowercase(),
            tests,
            vulnerabilities
        );
    }
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}
