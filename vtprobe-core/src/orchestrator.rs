// vtprobe-core/src/orchestrator.rs
//! Drives a probe run through its fixed sequence of phases.
//!
//! The orchestrator is a small state machine:
//! `Init -> ControlChars -> Csi -> Sgr -> Osc -> MaliciousPayloads ->
//! EdgeCases -> Report -> Done`. Every transition is unconditional. A
//! record that cannot be stored is logged and skipped; a sink that fails is
//! disabled; the run always reaches `Done`.
//!
//! License: MIT OR APACHE 2.0

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::Catalog;
use crate::classifier::classify;
use crate::config::{GeneratorLimits, ProbeConfig, ReportFormat};
use crate::generator;
use crate::observer::{LogObserver, RunObserver};
use crate::recorder::{Clock, Recorder, RunLog, RunSinks, Sink, SinkPaths, SystemClock};
use crate::report::{synthesize, RunSummary};
use crate::sequence::Category;

/// States of a probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Phase(Category),
    Report,
    Done,
}

impl RunState {
    /// The state that follows this one.
    pub fn next(self) -> RunState {
        match self {
            RunState::Init => RunState::Phase(Category::ALL[0]),
            RunState::Phase(current) => Category::ALL
                .iter()
                .position(|&c| c == current)
                .and_then(|i| Category::ALL.get(i + 1))
                .map_or(RunState::Report, |&c| RunState::Phase(c)),
            RunState::Report => RunState::Done,
            RunState::Done => RunState::Done,
        }
    }
}

/// What a finished run hands back.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub log: RunLog,
    pub summary: RunSummary,
    /// The rendered report, when rendering succeeded.
    pub report: Option<String>,
    /// Always [`RunState::Done`] once the outcome exists.
    pub final_state: RunState,
}

/// Owns the state of one run: catalog, settings, random source, recorder
/// and report sink.
pub struct Orchestrator<'a, R: Rng> {
    catalog: &'a Catalog,
    config: ProbeConfig,
    rng: R,
    seed: Option<u64>,
    recorder: Recorder,
    report_sink: Sink,
    sink_paths: SinkPaths,
    clock: Box<dyn Clock>,
    state: RunState,
    outcome: Option<RunOutcome>,
}

impl<'a> Orchestrator<'a, StdRng> {
    /// Builds a run from configuration: opens the sinks and seeds the random
    /// source from the configured seed or the current time.
    pub fn from_config(
        catalog: &'a Catalog,
        config: &ProbeConfig,
        observer: Box<dyn RunObserver>,
    ) -> Self {
        let seed = config.seed.unwrap_or_else(seed_from_time);
        let sinks = RunSinks::open(&config.output);
        let recorder = Recorder::new(sinks.tests, sinks.vulnerabilities, observer);
        Orchestrator::new(catalog, config, StdRng::seed_from_u64(seed), recorder, sinks.report)
            .with_seed(seed)
    }
}

impl<'a, R: Rng> Orchestrator<'a, R> {
    /// Invalid generator limits are replaced by the defaults so generation
    /// cannot fail.
    pub fn new(
        catalog: &'a Catalog,
        config: &ProbeConfig,
        rng: R,
        recorder: Recorder,
        report_sink: Sink,
    ) -> Self {
        let mut config = config.clone();
        if let Err(e) = config.generator.validate() {
            warn!("{}; using default generator limits.", e);
            config.generator = GeneratorLimits::default();
        }
        Self {
            catalog,
            sink_paths: SinkPaths::from(&config.output),
            config,
            rng,
            seed: None,
            recorder,
            report_sink,
            clock: Box::new(SystemClock),
            state: RunState::Init,
            outcome: None,
        }
    }

    /// Seed value shown in the report.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Clock used for the report timestamp.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The generator limits in effect for this run.
    pub fn limits(&self) -> &GeneratorLimits {
        &self.config.generator
    }

    /// The outcome of a run that has reached [`RunState::Done`].
    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Runs every remaining state and returns the frozen log and summary.
    pub fn run(mut self) -> RunOutcome {
        info!("Starting terminal escape sequence probe.");
        loop {
            if let Some(outcome) = self.outcome.take() {
                return outcome;
            }
            self.step();
        }
    }

    /// Executes the current state and advances to the next. Stepping a
    /// finished run does nothing.
    pub fn step(&mut self) {
        match self.state {
            RunState::Init => debug!("Catalog sizes: {:?}", self.catalog.sizes()),
            RunState::Phase(category) => self.run_phase(category),
            RunState::Report => self.finish_report(),
            RunState::Done => return,
        }
        self.state = self.state.next();
    }

    fn run_phase(&mut self, category: Category) {
        if !self.config.phase_enabled(category) {
            self.recorder.observer().phase_skipped(category);
            return;
        }

        let sequences = generator::generate(category, self.catalog, &self.config.generator, &mut self.rng);
        self.recorder.observer().phase_started(category, sequences.len());

        let tests_before = self.recorder.tests().len();
        let vulns_before = self.recorder.vulnerabilities().len();
        for sequence in &sequences {
            self.recorder.record_test(sequence);
            for label in classify(sequence) {
                if let Err(e) = self.recorder.record_vulnerability(sequence, label) {
                    warn!("Skipping finding '{}': {}", label, e);
                }
            }
        }

        let tests = self.recorder.tests().len() - tests_before;
        let vulns = self.recorder.vulnerabilities().len() - vulns_before;
        self.recorder.observer().phase_finished(category, tests, vulns);
    }

    fn finish_report(&mut self) {
        let generated_at = self.clock.now();
        let log = self.recorder.finish();
        let (summary, report) = write_report(
            self.catalog,
            &log,
            &self.sink_paths,
            generated_at,
            self.seed,
            self.config.output.report_format,
            &mut self.report_sink,
        );

        info!(
            "Probe complete: {} tests, {} vulnerabilities.",
            log.tests.len(),
            log.vulnerabilities.len()
        );
        self.outcome = Some(RunOutcome { log, summary, report, final_state: RunState::Done });
    }
}

fn write_report(
    catalog: &Catalog,
    log: &RunLog,
    sink_paths: &SinkPaths,
    generated_at: DateTime<Utc>,
    seed: Option<u64>,
    format: ReportFormat,
    sink: &mut Sink,
) -> (RunSummary, Option<String>) {
    let summary = synthesize(&catalog.sizes(), &log.counts(), sink_paths, generated_at, seed);
    let rendered = match format {
        ReportFormat::Text => summary.render_text(),
        ReportFormat::Json => summary.render_json(),
    };
    match rendered {
        Ok(text) => {
            if sink.write_document(&text) {
                debug!("Report written to {}", sink_paths.report);
            }
            (summary, Some(text))
        }
        Err(e) => {
            warn!("{}", e);
            (summary, None)
        }
    }
}

fn seed_from_time() -> u64 {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .map_or_else(|| now.timestamp() as u64, |n| n as u64)
}

/// Runs the full pipeline over `catalog` with the given observer.
pub fn run_probe(catalog: &Catalog, config: &ProbeConfig, observer: Box<dyn RunObserver>) -> RunOutcome {
    Orchestrator::from_config(catalog, config, observer).run()
}

/// Runs the full pipeline over the standard catalog as a side effect and
/// returns `input` unchanged. Findings are only observable through the sinks.
pub fn run_passthrough<T>(input: T, config: &ProbeConfig) -> T {
    let catalog = Catalog::standard().with_extra_payloads(&config.extra_payloads);
    let outcome = run_probe(&catalog, config, Box::new(LogObserver));
    debug!(
        "Passthrough run recorded {} tests and {} vulnerabilities.",
        outcome.log.tests.len(),
        outcome.log.vulnerabilities.len()
    );
    input
}
