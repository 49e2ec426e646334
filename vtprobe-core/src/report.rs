// vtprobe-core/src/report.rs
//! Report synthesis: turns catalog sizes and record counts into the run
//! summary document.
//!
//! `synthesize` is pure. Rendering is deterministic, so two summaries built
//! from the same inputs and the same timestamp render to identical text.
//!
//! License: MIT OR APACHE 2.0

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::catalog::CatalogSizes;
use crate::errors::VtprobeError;
use crate::recorder::{RunCounts, SinkPaths, TIMESTAMP_FORMAT};
use crate::sequence::Category;

/// Security-finding categories the probe covers.
pub const FINDINGS_COVERED: &[&str] = &[
    "Control characters that ring the bell or start unexpected escape sequences",
    "DEC private modes that switch to the alternate screen buffer and hide output",
    "SGR colour combinations that render text invisible",
    "OSC 52 clipboard writes and reads",
    "OSC 8 hyperlinks whose visible text differs from their target",
    "OSC 777 and OSC 9 desktop notifications",
    "Proprietary OSC commands (iTerm2 1337) and file transfer (OSC 5113)",
    "Previously documented terminal attack payloads",
    "Multi-vector payloads combining several hazards",
    "Integer overflow through oversized cursor parameters",
    "Parser confusion through malformed sequences",
    "Denial of service through character repetition",
];

/// Remediation advice appended to every report.
pub const RECOMMENDATIONS: &[&str] = &[
    "Strip or escape control characters before writing untrusted text to a terminal",
    "Disable or confirm OSC 52 clipboard access in terminal emulators",
    "Show the target of OSC 8 hyperlinks before opening them",
    "Clamp numeric CSI parameters to the screen size before doing arithmetic",
    "Cap repeat counts and discard sequences that exceed a length limit",
    "Reject unterminated or malformed sequences instead of guessing their end",
    "Treat proprietary OSC commands and file-transfer protocols as opt-in",
    "Restore the primary screen and default rendition after displaying untrusted output",
];

/// Per-category line of the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub title: String,
    pub tests: usize,
    pub vulnerabilities: usize,
}

/// One distinct hazard label with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub occurrences: usize,
}

/// The structured summary of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub seed: String,
    pub catalog: CatalogSizes,
    pub categories: Vec<CategorySummary>,
    pub total_tests: usize,
    pub total_vulnerabilities: usize,
    pub distinct_findings: usize,
    pub hazard_labels: Vec<LabelSummary>,
    pub findings_covered: Vec<String>,
    pub recommendations: Vec<String>,
    pub sinks: SinkPaths,
}

static TEXT_TEMPLATE: &str = "Terminal Escape Sequence Security Report
========================================
Generated: {generated_at}
Seed: {seed}

Catalog
-------
Control characters: {catalog.control_chars}
CSI commands: {catalog.csi_commands}
SGR parameters: {catalog.sgr_params}
OSC commands: {catalog.osc_commands}
DEC private modes: {catalog.private_modes}
Malicious payloads: {catalog.malicious_payloads}
Palette samples: {catalog.palette_entries}

Results by category
-------------------
{{ for c in categories }}{c.title}: {c.tests} tests, {c.vulnerabilities} vulnerabilities
{{ endfor }}
Total tests: {total_tests}
Total vulnerabilities: {total_vulnerabilities}
Distinct findings: {distinct_findings}

Hazard labels
-------------
{{ for l in hazard_labels }}- {l.label} ({l.occurrences})
{{ endfor }}
Security findings covered
-------------------------
{{ for f in findings_covered }}- {f}
{{ endfor }}
Recommendations
---------------
{{ for r in recommendations }}- {r}
{{ endfor }}
Output files
------------
Test log: {sinks.test_log}
Vulnerability log: {sinks.vulnerability_log}
Report: {sinks.report}
";

/// Builds the run summary. Categories appear in phase order; those that
/// produced no records are listed with zero counts.
pub fn synthesize(
    sizes: &CatalogSizes,
    counts: &RunCounts,
    sinks: &SinkPaths,
    generated_at: DateTime<Utc>,
    seed: Option<u64>,
) -> RunSummary {
    let categories = Category::ALL
        .iter()
        .map(|&category| {
            let c = counts.category(category);
            CategorySummary {
                category,
                title: category.title().to_string(),
                tests: c.tests,
                vulnerabilities: c.vulnerabilities,
            }
        })
        .collect();

    let hazard_labels = counts
        .labels
        .iter()
        .map(|(label, &occurrences)| LabelSummary { label: label.clone(), occurrences })
        .collect();

    RunSummary {
        generated_at: generated_at.format(TIMESTAMP_FORMAT).to_string(),
        seed: seed.map_or_else(|| "unseeded".to_string(), |s| s.to_string()),
        catalog: *sizes,
        categories,
        total_tests: counts.total_tests(),
        total_vulnerabilities: counts.total_vulnerabilities(),
        distinct_findings: counts.distinct_findings,
        hazard_labels,
        findings_covered: FINDINGS_COVERED.iter().map(|s| s.to_string()).collect(),
        recommendations: RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
        sinks: sinks.clone(),
    }
}

impl RunSummary {
    /// Plain-text rendering.
    pub fn render_text(&self) -> Result<String, VtprobeError> {
        let mut tt = TinyTemplate::new();
        tt.set_default_formatter(&tinytemplate::format_unescaped);
        tt.add_template("report", TEXT_TEMPLATE)
            .map_err(|e| VtprobeError::ReportRender(e.to_string()))?;
        let text = tt
            .render("report", self)
            .map_err(|e| VtprobeError::ReportRender(e.to_string()))?;
        debug!("Rendered text report ({} bytes).", text.len());
        Ok(text)
    }

    /// Pretty-printed JSON rendering.
    pub fn render_json(&self) -> Result<String, VtprobeError> {
        serde_json::to_string_pretty(self)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| VtprobeError::ReportRender(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::CategoryCount;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn counts() -> RunCounts {
        let mut per_category = BTreeMap::new();
        per_category.insert(Category::ControlChars, CategoryCount { tests: 33, vulnerabilities: 2 });
        let mut labels = BTreeMap::new();
        labels.insert("DoS via terminal bell".to_string(), 1);
        labels.insert("injection vector".to_string(), 1);
        RunCounts { per_category, labels, distinct_findings: 2 }
    }

    fn sizes() -> CatalogSizes {
        CatalogSizes { control_chars: 33, csi_commands: 1, ..CatalogSizes::default() }
    }

    #[test]
    fn text_report_is_idempotent_with_fixed_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let sinks = SinkPaths::default();
        let a = synthesize(&sizes(), &counts(), &sinks, at, Some(9)).render_text().unwrap();
        let b = synthesize(&sizes(), &counts(), &sinks, at, Some(9)).render_text().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn text_report_contents() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let sinks = SinkPaths {
            test_log: "t.log".into(),
            vulnerability_log: "v.log".into(),
            report: "r.txt".into(),
        };
        let text = synthesize(&sizes(), &counts(), &sinks, at, None).render_text().unwrap();
        assert!(text.contains("Generated: 2024-01-02 03:04:05"));
        assert!(text.contains("Seed: unseeded"));
        assert!(text.contains("Control characters: 33"));
        assert!(text.contains("Control characters: 33 tests, 2 vulnerabilities"));
        assert!(text.contains("CSI sequences: 0 tests, 0 vulnerabilities"));
        assert!(text.contains("- DoS via terminal bell (1)"));
        assert!(text.contains("Vulnerability log: v.log"));
        for rec in RECOMMENDATIONS {
            assert!(text.contains(rec));
        }
    }

    #[test]
    fn json_report_parses_back() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let json = synthesize(&sizes(), &counts(), &SinkPaths::default(), at, Some(1))
            .render_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_tests"], 33);
        assert_eq!(value["categories"][0]["category"], "control-chars");
        assert_eq!(value["seed"], "1");
    }
}
