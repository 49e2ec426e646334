// vtprobe/src/commands/mod.rs
pub mod catalog;
pub mod run;
