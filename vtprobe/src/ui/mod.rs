// vtprobe/src/ui/mod.rs
pub mod console;
pub mod output_format;
pub mod run_summary;
pub mod theme;
