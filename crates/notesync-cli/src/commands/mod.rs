//! Subcommand implementations.

pub mod config;
pub mod status;
pub mod sync;
