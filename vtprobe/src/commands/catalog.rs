//! `vtprobe catalog`: shows what a run would generate without running it.

use anyhow::Result;
use is_terminal::IsTerminal;
use std::io;
use std::path::PathBuf;

use vtprobe_core::{Catalog, ProbeConfig};

use crate::ui::run_summary;
use crate::ui::theme::ThemeMap;

pub fn run_catalog_command(config: Option<PathBuf>, theme_map: &ThemeMap) -> Result<()> {
    let config = match config {
        Some(path) => ProbeConfig::load_from_file(path)?,
        None => ProbeConfig::default(),
    };
    let catalog = Catalog::standard().with_extra_payloads(&config.extra_payloads);

    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    let mut writer = stdout.lock();
    run_summary::print_catalog(&catalog, &config.generator, &mut writer, theme_map, supports_color)
}
