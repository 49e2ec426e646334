//! Configuration management for `vtprobe-core`.
//!
//! This module defines the knobs of a probe run: where the three sinks live,
//! how many randomized variants the generator produces, an optional seed,
//! which phases run, and extra payloads to append to the catalog. Every field
//! has a default, so an empty YAML document is a valid configuration.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::VtprobeError;
use crate::sequence::Category;

pub const DEFAULT_TEST_LOG: &str = "terminal_tests.log";
pub const DEFAULT_VULNERABILITY_LOG: &str = "terminal_vulnerabilities.log";
pub const DEFAULT_REPORT: &str = "terminal_security_report.txt";

/// How the report sink is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Locations of the three run sinks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Append-only log of every generated test case.
    pub test_log: PathBuf,
    /// Append-only log of vulnerability findings only.
    pub vulnerability_log: PathBuf,
    /// Report document, overwritten on each run.
    pub report: PathBuf,
    pub report_format: ReportFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            test_log: PathBuf::from(DEFAULT_TEST_LOG),
            vulnerability_log: PathBuf::from(DEFAULT_VULNERABILITY_LOG),
            report: PathBuf::from(DEFAULT_REPORT),
            report_format: ReportFormat::Text,
        }
    }
}

/// Variant counts and value ranges for the randomized generator cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorLimits {
    /// CSI variants carrying one random parameter.
    pub single_param_variants: usize,
    /// Exclusive upper bound of the single random parameter.
    pub single_param_max: u32,
    /// CSI variants carrying two random parameters.
    pub double_param_variants: usize,
    /// Exclusive upper bound of each of the two random parameters.
    pub double_param_max: u32,
    /// Random 24-bit foreground SGR sequences.
    pub rgb_variants: usize,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        Self {
            single_param_variants: 10,
            single_param_max: 1000,
            double_param_variants: 5,
            double_param_max: 100,
            rgb_variants: 5,
        }
    }
}

impl GeneratorLimits {
    /// Rejects empty random ranges; variant counts of zero are allowed.
    pub fn validate(&self) -> Result<(), VtprobeError> {
        if self.single_param_max == 0 {
            return Err(VtprobeError::InvalidLimits(
                "'single_param_max' must be greater than 0".to_string(),
            ));
        }
        if self.double_param_max == 0 {
            return Err(VtprobeError::InvalidLimits(
                "'double_param_max' must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration of a probe run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub output: OutputConfig,
    pub generator: GeneratorLimits,
    /// Seed for the randomized variants. Seeded from the clock when absent.
    pub seed: Option<u64>,
    /// Phases to run. All phases run when absent.
    pub phases: Option<Vec<Category>>,
    /// Payloads appended to the curated catalog list.
    pub extra_payloads: Vec<String>,
}

impl ProbeConfig {
    /// Loads a probe configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading probe configuration from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ProbeConfig = serde_yml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(
            "Loaded config: seed={:?}, phases={:?}, {} extra payloads.",
            config.seed,
            config.phases,
            config.extra_payloads.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.generator.validate()?;
        if let Some(phases) = &self.phases {
            if phases.is_empty() {
                return Err(anyhow!("'phases' is set but lists no phase; omit it to run every phase."));
            }
        }
        Ok(())
    }

    /// Moves every sink whose path is relative into `dir`.
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        let dir = dir.as_ref();
        for path in [
            &mut self.output.test_log,
            &mut self.output.vulnerability_log,
            &mut self.output.report,
        ] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
        self
    }

    /// Whether the given phase is enabled for this run.
    pub fn phase_enabled(&self, category: Category) -> bool {
        self.phases
            .as_ref()
            .map_or(true, |phases| phases.contains(&category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config: ProbeConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config, ProbeConfig::default());
        assert_eq!(config.generator.single_param_variants, 10);
        assert_eq!(config.output.report, PathBuf::from(DEFAULT_REPORT));
    }

    #[test]
    fn zero_range_is_rejected() {
        let limits = GeneratorLimits { double_param_max: 0, ..GeneratorLimits::default() };
        assert!(matches!(limits.validate(), Err(VtprobeError::InvalidLimits(_))));
    }

    #[test]
    fn output_dir_only_moves_relative_paths() {
        let mut config = ProbeConfig::default();
        config.output.report = PathBuf::from("/abs/report.txt");
        let config = config.with_output_dir("out");
        assert_eq!(config.output.test_log, Path::new("out").join(DEFAULT_TEST_LOG));
        assert_eq!(config.output.report, PathBuf::from("/abs/report.txt"));
    }

    #[test]
    fn phase_filter() {
        let config = ProbeConfig {
            phases: Some(vec![Category::Osc]),
            ..ProbeConfig::default()
        };
        assert!(config.phase_enabled(Category::Osc));
        assert!(!config.phase_enabled(Category::Csi));
        assert!(ProbeConfig::default().phase_enabled(Category::Csi));
    }
}
