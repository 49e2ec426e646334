//! `vtprobe run`: executes the probe pipeline and prints the summary.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::io::{self, Write};
use std::path::PathBuf;

use vtprobe_core::{
    run_probe, Catalog, Category, ProbeConfig, ReportFormat, RunObserver, SilentObserver,
};

use crate::ui::console::ConsoleObserver;
use crate::ui::output_format;
use crate::ui::run_summary;
use crate::ui::theme::ThemeMap;

/// Options for the run command, resolved from the command line.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub token: Option<String>,
    pub config: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub phases: Vec<Category>,
    pub json: bool,
    pub no_summary: bool,
    pub quiet: bool,
}

/// Loads the configuration file if one was given and applies command-line
/// overrides on top of it.
pub fn resolve_config(opts: &RunOptions) -> Result<ProbeConfig> {
    let mut config = match &opts.config {
        Some(path) => ProbeConfig::load_from_file(path)?,
        None => ProbeConfig::default(),
    };
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    if !opts.phases.is_empty() {
        config.phases = Some(opts.phases.clone());
    }
    if opts.json {
        config.output.report_format = ReportFormat::Json;
    }
    if let Some(dir) = &opts.out_dir {
        config = config.with_output_dir(dir);
    }
    config.validate().context("Invalid probe configuration")?;
    Ok(config)
}

/// Runs the probe. The token, when given, is echoed unchanged on stdout.
pub fn run_probe_command(opts: RunOptions, theme_map: &ThemeMap) -> Result<()> {
    info!("Starting vtprobe run.");
    let config = resolve_config(&opts)?;
    let catalog = Catalog::standard().with_extra_payloads(&config.extra_payloads);
    debug!("Catalog sizes: {:?}", catalog.sizes());

    let observer: Box<dyn RunObserver> = if opts.quiet {
        Box::new(SilentObserver)
    } else {
        Box::new(ConsoleObserver::stderr(theme_map.clone()))
    };
    let outcome = run_probe(&catalog, &config, observer);

    let stderr_supports_color = io::stderr().is_terminal();
    if outcome.report.is_none() && !opts.quiet {
        let _ = output_format::print_warn_message(
            &mut io::stderr(),
            "The report could not be rendered; see the log for details.",
            theme_map,
            stderr_supports_color,
        );
    }
    if !opts.no_summary && !opts.quiet {
        run_summary::print_summary(&outcome.summary, &mut io::stderr(), theme_map, stderr_supports_color)?;
    }

    if let Some(token) = opts.token {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        writeln!(writer, "{}", token)?;
    }

    info!("vtprobe run completed.");
    Ok(())
}
