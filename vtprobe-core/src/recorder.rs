// vtprobe-core/src/recorder.rs
//! The run recorder: append-only test and vulnerability logs.
//!
//! The recorder is the only component that performs per-sequence I/O. It
//! keeps every record in memory and mirrors each one as a line in its sink.
//! A sink that cannot be opened or written is disabled with a single warning;
//! the in-memory logs are always complete.
//!
//! License: MIT OR APACHE 2.0

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::classifier::HazardLabel;
use crate::config::OutputConfig;
use crate::errors::VtprobeError;
use crate::observer::RunObserver;
use crate::sequence::{Category, Sequence};

/// Timestamp layout used in sink lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of record timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// An output file, written line by line.
///
/// Write failures disable the sink for the rest of the run; nothing is
/// retried.
pub struct Sink {
    name: &'static str,
    path: Option<PathBuf>,
    writer: Option<Box<dyn Write>>,
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("active", &self.writer.is_some())
            .finish()
    }
}

impl Sink {
    /// Opens `path` for appending, creating it if needed.
    pub fn append(name: &'static str, path: &Path) -> Self {
        Self::open_with(name, path, OpenOptions::new().create(true).append(true).clone())
    }

    /// Opens `path` truncated.
    pub fn overwrite(name: &'static str, path: &Path) -> Self {
        Self::open_with(name, path, OpenOptions::new().create(true).write(true).truncate(true).clone())
    }

    fn open_with(name: &'static str, path: &Path, options: OpenOptions) -> Self {
        let writer = match Self::try_open(path, &options) {
            Ok(file) => {
                debug!("Opened {} sink at {}", name, path.display());
                Some(Box::new(BufWriter::new(file)) as Box<dyn Write>)
            }
            Err(e) => {
                warn!("{}", e.with_sink(name, path));
                None
            }
        };
        Self { name, path: Some(path.to_path_buf()), writer }
    }

    fn try_open(path: &Path, options: &OpenOptions) -> std::io::Result<File> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        options.open(path)
    }

    /// Wraps an arbitrary writer.
    pub fn from_writer(name: &'static str, writer: Box<dyn Write>) -> Self {
        Self { name, path: None, writer: Some(writer) }
    }

    /// A sink that accepts and drops everything.
    pub fn disabled(name: &'static str) -> Self {
        Self { name, path: None, writer: None }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// Writes one line. Returns whether the line was written.
    pub fn write_line(&mut self, line: &str) -> bool {
        self.write_all(format!("{}\n", line).as_bytes())
    }

    /// Writes a whole document. Returns whether it was written.
    pub fn write_document(&mut self, text: &str) -> bool {
        self.write_all(text.as_bytes()) && self.flush()
    }

    fn write_all(&mut self, bytes: &[u8]) -> bool {
        let Some(writer) = self.writer.as_mut() else {
            return false;
        };
        match writer.write_all(bytes) {
            Ok(()) => true,
            Err(e) => {
                self.disable(e);
                false
            }
        }
    }

    pub fn flush(&mut self) -> bool {
        let Some(writer) = self.writer.as_mut() else {
            return false;
        };
        match writer.flush() {
            Ok(()) => true,
            Err(e) => {
                self.disable(e);
                false
            }
        }
    }

    fn disable(&mut self, e: std::io::Error) {
        let label = self
            .path
            .as_ref()
            .map_or_else(|| self.name.to_string(), |p| p.display().to_string());
        warn!(
            "{}; further writes to the {} sink are skipped for this run.",
            VtprobeError::SinkUnavailable(label, e),
            self.name
        );
        self.writer = None;
    }
}

impl Drop for Sink {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

trait WithSink {
    fn with_sink(self, name: &str, path: &Path) -> VtprobeError;
}

impl WithSink for std::io::Error {
    fn with_sink(self, name: &str, path: &Path) -> VtprobeError {
        VtprobeError::SinkUnavailable(format!("{} ({})", name, path.display()), self)
    }
}

/// The three sinks of a run, opened together at run start.
#[derive(Debug)]
pub struct RunSinks {
    pub tests: Sink,
    pub vulnerabilities: Sink,
    pub report: Sink,
}

impl RunSinks {
    pub fn open(output: &OutputConfig) -> Self {
        Self {
            tests: Sink::append("test log", &output.test_log),
            vulnerabilities: Sink::append("vulnerability log", &output.vulnerability_log),
            report: Sink::overwrite("report", &output.report),
        }
    }

    /// Sinks that write nowhere; the run still produces in-memory logs.
    pub fn disabled() -> Self {
        Self {
            tests: Sink::disabled("test log"),
            vulnerabilities: Sink::disabled("vulnerability log"),
            report: Sink::disabled("report"),
        }
    }
}

/// Where the sinks of a run point, for the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SinkPaths {
    pub test_log: String,
    pub vulnerability_log: String,
    pub report: String,
}

impl From<&OutputConfig> for SinkPaths {
    fn from(output: &OutputConfig) -> Self {
        Self {
            test_log: output.test_log.display().to_string(),
            vulnerability_log: output.vulnerability_log.display().to_string(),
            report: output.report.display().to_string(),
        }
    }
}

/// One generated test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    pub timestamp: DateTime<Utc>,
    pub sequence: Sequence,
    pub description: String,
}

impl TestRecord {
    /// The line written to the test sink.
    pub fn log_line(&self) -> String {
        format!(
            "[{}] Testing: {} - {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.description,
            self.sequence.escaped()
        )
    }
}

/// One hazard classification of a tested sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VulnerabilityRecord {
    pub timestamp: DateTime<Utc>,
    pub sequence: Sequence,
    pub label: HazardLabel,
}

impl VulnerabilityRecord {
    /// The line written to the vulnerability sink.
    pub fn log_line(&self) -> String {
        format!(
            "[{}] VULNERABILITY: {} - Sequence: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.label,
            self.sequence.escaped()
        )
    }

    /// Content fingerprint of the finding: label plus bytes, independent of
    /// timestamp and description.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.label.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(self.sequence.bytes.as_bytes());
        let mut digest = hex::encode(hasher.finalize());
        digest.truncate(16);
        digest
    }
}

/// Appends records and mirrors them to the test and vulnerability sinks.
pub struct Recorder {
    tests: Vec<TestRecord>,
    vulnerabilities: Vec<VulnerabilityRecord>,
    tested: HashSet<String>,
    test_sink: Sink,
    vulnerability_sink: Sink,
    clock: Box<dyn Clock>,
    observer: Box<dyn RunObserver>,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("tests", &self.tests.len())
            .field("vulnerabilities", &self.vulnerabilities.len())
            .field("test_sink", &self.test_sink)
            .field("vulnerability_sink", &self.vulnerability_sink)
            .finish()
    }
}

impl Recorder {
    pub fn new(test_sink: Sink, vulnerability_sink: Sink, observer: Box<dyn RunObserver>) -> Self {
        Self::with_clock(test_sink, vulnerability_sink, observer, Box::new(SystemClock))
    }

    pub fn with_clock(
        test_sink: Sink,
        vulnerability_sink: Sink,
        observer: Box<dyn RunObserver>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            tests: Vec::new(),
            vulnerabilities: Vec::new(),
            tested: HashSet::new(),
            test_sink,
            vulnerability_sink,
            clock,
            observer,
        }
    }

    /// Appends a test record. Never fails; a broken sink only loses the line.
    pub fn record_test(&mut self, sequence: &Sequence) {
        let record = TestRecord {
            timestamp: self.clock.now(),
            sequence: sequence.clone(),
            description: sequence.description.clone(),
        };
        self.test_sink.write_line(&record.log_line());
        self.tested.insert(sequence.bytes.clone());
        self.tests.push(record);
    }

    /// Appends a vulnerability record for a sequence already tested in this
    /// run, and notifies the observer.
    pub fn record_vulnerability(
        &mut self,
        sequence: &Sequence,
        label: HazardLabel,
    ) -> Result<(), VtprobeError> {
        if !self.tested.contains(&sequence.bytes) {
            return Err(VtprobeError::OrphanFinding(sequence.escaped()));
        }
        let record = VulnerabilityRecord {
            timestamp: self.clock.now(),
            sequence: sequence.clone(),
            label,
        };
        self.vulnerability_sink.write_line(&record.log_line());
        self.observer.vulnerability_found(&record);
        self.vulnerabilities.push(record);
        Ok(())
    }

    pub fn observer(&mut self) -> &mut dyn RunObserver {
        self.observer.as_mut()
    }

    pub fn tests(&self) -> &[TestRecord] {
        &self.tests
    }

    pub fn vulnerabilities(&self) -> &[VulnerabilityRecord] {
        &self.vulnerabilities
    }

    /// Flushes both sinks and freezes the logs, leaving the recorder empty.
    pub fn finish(&mut self) -> RunLog {
        self.test_sink.flush();
        self.vulnerability_sink.flush();
        debug!(
            "Recorder finished with {} tests and {} vulnerabilities.",
            self.tests.len(),
            self.vulnerabilities.len()
        );
        RunLog {
            tests: std::mem::take(&mut self.tests),
            vulnerabilities: std::mem::take(&mut self.vulnerabilities),
        }
    }
}

/// The frozen record logs of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunLog {
    pub tests: Vec<TestRecord>,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
}

/// Test and vulnerability counts of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub tests: usize,
    pub vulnerabilities: usize,
}

/// Aggregated counts over a run log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub per_category: BTreeMap<Category, CategoryCount>,
    /// Occurrences per hazard label text.
    pub labels: BTreeMap<String, usize>,
    pub distinct_findings: usize,
}

impl RunCounts {
    pub fn total_tests(&self) -> usize {
        self.per_category.values().map(|c| c.tests).sum()
    }

    pub fn total_vulnerabilities(&self) -> usize {
        self.per_category.values().map(|c| c.vulnerabilities).sum()
    }

    pub fn category(&self, category: Category) -> CategoryCount {
        self.per_category.get(&category).copied().unwrap_or_default()
    }
}

impl RunLog {
    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts::default();
        for record in &self.tests {
            counts.per_category.entry(record.sequence.category).or_default().tests += 1;
        }
        let mut fingerprints = HashSet::new();
        for record in &self.vulnerabilities {
            counts
                .per_category
                .entry(record.sequence.category)
                .or_default()
                .vulnerabilities += 1;
            *counts.labels.entry(record.label.to_string()).or_default() += 1;
            fingerprints.insert(record.fingerprint());
        }
        counts.distinct_findings = fingerprints.len();
        counts
    }

    /// Test records generated in one category.
    pub fn tests_in(&self, category: Category) -> impl Iterator<Item = &TestRecord> {
        self.tests.iter().filter(move |r| r.sequence.category == category)
    }

    /// Vulnerability records found in one category.
    pub fn vulnerabilities_in(&self, category: Category) -> impl Iterator<Item = &VulnerabilityRecord> {
        self.vulnerabilities.iter().filter(move |r| r.sequence.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::SilentObserver;
    use crate::sequence::Origin;
    use chrono::TimeZone;

    fn fixed_clock() -> Box<dyn Clock> {
        Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
    }

    fn bell() -> Sequence {
        Sequence::new("\x07", "Control character BEL (0x07)", Category::ControlChars, Origin::ControlChar { code: 7 })
    }

    #[test]
    fn sink_lines_use_escaped_sequences() {
        let mut recorder = Recorder::with_clock(
            Sink::disabled("t"),
            Sink::disabled("v"),
            Box::new(SilentObserver),
            fixed_clock(),
        );
        recorder.record_test(&bell());
        recorder.record_vulnerability(&bell(), HazardLabel::TerminalBell).unwrap();
        assert_eq!(
            recorder.tests()[0].log_line(),
            "[2024-05-01 12:00:00] Testing: Control character BEL (0x07) - \\x07"
        );
        assert_eq!(
            recorder.vulnerabilities()[0].log_line(),
            "[2024-05-01 12:00:00] VULNERABILITY: DoS via terminal bell - Sequence: \\x07"
        );
    }

    #[test]
    fn orphan_findings_are_rejected() {
        let mut recorder = Recorder::new(Sink::disabled("t"), Sink::disabled("v"), Box::new(SilentObserver));
        let err = recorder.record_vulnerability(&bell(), HazardLabel::TerminalBell).unwrap_err();
        assert!(matches!(err, VtprobeError::OrphanFinding(_)));
        assert!(recorder.vulnerabilities().is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let mut recorder = Recorder::new(Sink::disabled("t"), Sink::disabled("v"), Box::new(SilentObserver));
        for _ in 0..3 {
            recorder.record_test(&bell());
            recorder.record_vulnerability(&bell(), HazardLabel::TerminalBell).unwrap();
        }
        let log = recorder.finish();
        assert_eq!(log.tests.len(), 3);
        let counts = log.counts();
        assert_eq!(counts.total_vulnerabilities(), 3);
        assert_eq!(counts.distinct_findings, 1);
        assert_eq!(counts.labels.get("DoS via terminal bell"), Some(&3));
    }

    #[test]
    fn fingerprint_ignores_timestamp() {
        let a = VulnerabilityRecord {
            timestamp: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            sequence: bell(),
            label: HazardLabel::TerminalBell,
        };
        let b = VulnerabilityRecord { timestamp: Utc::now(), ..a.clone() };
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
