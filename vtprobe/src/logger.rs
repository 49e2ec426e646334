// vtprobe/src/logger.rs
//! Logger setup for the vtprobe binary.
//!
//! Honours `RUST_LOG`; an explicit level from the command line wins over it.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Default filter when `RUST_LOG` is unset. Sink warnings stay visible.
const DEFAULT_FILTER: &str = "warn";

/// Initializes `env_logger` on stderr. Calling it twice is harmless.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.target(Target::Stderr).format_timestamp(None);
    if builder.try_init().is_err() {
        log::debug!("Logger already initialized.");
    }
}
