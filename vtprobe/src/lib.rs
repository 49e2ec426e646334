// vtprobe/src/lib.rs
//! # vtprobe CLI Application
//!
//! This crate provides the command-line front end for `vtprobe-core`: argument
//! parsing, logger setup, themed progress output and summary tables.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

pub use commands::catalog::run_catalog_command;
pub use commands::run::{run_probe_command, RunOptions};
