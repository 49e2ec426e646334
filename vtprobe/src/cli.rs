// vtprobe/src/cli.rs
//! This file defines the command-line interface (CLI) for the vtprobe application,
//! including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vtprobe_core::Category;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "vtprobe",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Enumerate terminal escape sequences and flag the hazardous ones",
    long_about = "vtprobe generates control characters, CSI, SGR and OSC sequences, DEC private modes, known malicious payloads and malformed inputs, classifies each one against a set of terminal security hazards, and records every test case and finding to log files. Sequences are never written to the terminal.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Specify the path to a custom YAML theme file.
    #[arg(long = "theme", value_name = "FILE", global = true, help = "Specify the path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `vtprobe` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs every probe phase and writes the test log, vulnerability log and report.
    #[command(about = "Runs the probe and writes the test log, vulnerability log and report.")]
    Run(RunCommand),

    /// Prints catalog sizes and how many sequences each phase will generate.
    #[command(about = "Prints catalog sizes and the number of sequences each phase generates.")]
    Catalog(CatalogCommand),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunCommand {
    /// Value echoed on stdout once the run finishes.
    #[arg(value_name = "TOKEN", help = "Value echoed unchanged on stdout once the run finishes.")]
    pub token: Option<String>,

    /// Path to a probe configuration file (YAML).
    #[arg(long = "config", short = 'c', value_name = "FILE", help = "Path to a probe configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Directory that relative sink paths are placed in.
    #[arg(long = "out-dir", short = 'o', value_name = "DIR", help = "Directory for the test log, vulnerability log and report.")]
    pub out_dir: Option<PathBuf>,

    /// Seed for the randomized parameter variants.
    #[arg(long, value_name = "N", env = "VTPROBE_SEED", help = "Seed for the randomized parameter variants.")]
    pub seed: Option<u64>,

    /// Only run these phases (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "PHASES", help = "Only run these phases (comma-separated, e.g. 'control-chars,osc').")]
    pub phases: Vec<Category>,

    /// Render the report file as JSON.
    #[arg(long, help = "Write the report file as JSON instead of text.")]
    pub json: bool,

    /// Suppress the summary table.
    #[arg(long = "no-summary", help = "Suppress the run summary table.")]
    pub no_summary: bool,
}

/// Arguments for the `catalog` command.
#[derive(Parser, Debug)]
pub struct CatalogCommand {
    /// Path to a probe configuration file (YAML).
    #[arg(long = "config", short = 'c', value_name = "FILE", help = "Path to a probe configuration file (YAML).")]
    pub config: Option<PathBuf>,
}
