//! Summary tables printed after a run and by the `catalog` command.

use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use std::io::Write;

use vtprobe_core::generator::expected_count;
use vtprobe_core::{Catalog, Category, GeneratorLimits, RunSummary};

use crate::ui::output_format::{print_message, print_success_message};
use crate::ui::theme::{ThemeEntry, ThemeMap};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn count_cell(n: usize) -> Cell {
    Cell::new(n).set_alignment(CellAlignment::Right)
}

/// Prints per-category counts, hazard label totals and the sink locations.
pub fn print_summary<W: Write + ?Sized>(
    summary: &RunSummary,
    writer: &mut W,
    theme: &ThemeMap,
    supports_color: bool,
) -> Result<()> {
    print_message(writer, "Run Summary", ThemeEntry::Header, theme, supports_color)?;

    let mut table = new_table(vec!["Category", "Tests", "Vulnerabilities"]);
    for c in &summary.categories {
        table.add_row(vec![Cell::new(&c.title), count_cell(c.tests), count_cell(c.vulnerabilities)]);
    }
    table.add_row(vec![
        Cell::new("Total"),
        count_cell(summary.total_tests),
        count_cell(summary.total_vulnerabilities),
    ]);
    writeln!(writer, "{}", table)?;

    if !summary.hazard_labels.is_empty() {
        let mut labels = new_table(vec!["Hazard", "Occurrences"]);
        for l in &summary.hazard_labels {
            labels.add_row(vec![Cell::new(&l.label), count_cell(l.occurrences)]);
        }
        writeln!(writer, "{}", labels)?;
    }

    writeln!(
        writer,
        "Distinct findings: {} (seed {})",
        summary.distinct_findings, summary.seed
    )?;
    print_success_message(
        writer,
        &format!(
            "Logs written to {} and {}; report written to {}",
            summary.sinks.test_log, summary.sinks.vulnerability_log, summary.sinks.report
        ),
        theme,
        supports_color,
    )?;
    Ok(())
}

/// Prints catalog sizes and the number of sequences each phase generates.
pub fn print_catalog<W: Write + ?Sized>(
    catalog: &Catalog,
    limits: &GeneratorLimits,
    writer: &mut W,
    theme: &ThemeMap,
    supports_color: bool,
) -> Result<()> {
    let sizes = catalog.sizes();
    print_message(writer, "Catalog", ThemeEntry::Header, theme, supports_color)?;
    let mut entries = new_table(vec!["Table", "Entries"]);
    for (name, n) in [
        ("Control characters", sizes.control_chars),
        ("CSI commands", sizes.csi_commands),
        ("SGR parameters", sizes.sgr_params),
        ("OSC commands", sizes.osc_commands),
        ("DEC private modes", sizes.private_modes),
        ("Malicious payloads", sizes.malicious_payloads),
        ("Palette samples", sizes.palette_entries),
    ] {
        entries.add_row(vec![Cell::new(name), count_cell(n)]);
    }
    writeln!(writer, "{}", entries)?;

    print_message(writer, "Planned sequences", ThemeEntry::Header, theme, supports_color)?;
    let mut phases = new_table(vec!["Phase", "Name", "Sequences"]);
    let mut total = 0;
    for category in Category::ALL {
        let n = expected_count(category, catalog, limits);
        total += n;
        phases.add_row(vec![Cell::new(category.title()), Cell::new(category.as_str()), count_cell(n)]);
    }
    phases.add_row(vec![Cell::new("Total"), Cell::new(""), count_cell(total)]);
    writeln!(writer, "{}", phases)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;

    #[test]
    fn catalog_table_lists_every_phase() {
        let mut out = Vec::new();
        print_catalog(
            &Catalog::standard(),
            &GeneratorLimits::default(),
            &mut out,
            &ThemeStyle::default_theme_map(),
            false,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        for category in Category::ALL {
            assert!(text.contains(category.as_str()), "missing {}", category);
        }
        assert!(text.contains("Control characters"));
        assert!(text.contains("33"));
    }
}
