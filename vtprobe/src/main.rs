// vtprobe/src/main.rs
//! vtprobe entry point.
//!
//! Parses the command line, initializes logging and the theme, and dispatches
//! to the selected command. Any error is printed once on stderr and the
//! process exits with status 1.

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use log::LevelFilter;
use std::io;

use vtprobe::cli::{Cli, Commands};
use vtprobe::logger;
use vtprobe::ui::output_format::print_error_message;
use vtprobe::ui::theme::{build_theme_map, ThemeStyle};
use vtprobe::{run_catalog_command, run_probe_command, RunOptions};

fn main() {
    let args = Cli::parse();

    let level = if args.quiet {
        Some(LevelFilter::Off)
    } else if args.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    };
    logger::init_logger(level);

    if let Err(e) = run(args) {
        let theme = ThemeStyle::default_theme_map();
        let stderr_supports_color = io::stderr().is_terminal();
        let _ = print_error_message(&mut io::stderr(), &format!("{:#}", e), &theme, stderr_supports_color);
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    let theme_map = build_theme_map(args.theme.as_ref()).context("Theme error")?;

    match args.command {
        Commands::Run(cmd) => run_probe_command(
            RunOptions {
                token: cmd.token,
                config: cmd.config,
                out_dir: cmd.out_dir,
                seed: cmd.seed,
                phases: cmd.phases,
                json: cmd.json,
                no_summary: cmd.no_summary,
                quiet: args.quiet,
            },
            &theme_map,
        ),
        Commands::Catalog(cmd) => run_catalog_command(cmd.config, &theme_map),
    }
}
