//! CLI, configuration file, sync and status commands
//!
//! This crate provides the `notesync` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

use std::path::Path;
use std::process::ExitCode;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};

use cli::{Command, ConfigAction, SyncArgs};

/// Loads the configuration file named on the command line, or the default one.
pub fn load_config(path: Option<&Path>) -> CliResult<CliConfig> {
    match path {
        Some(path) => CliConfig::load_from(path),
        None => CliConfig::load(),
    }
}

/// Dispatches a parsed command line.
pub fn run(cli: Cli, config: &CliConfig) -> CliResult<ExitCode> {
    let config_path = cli.config.clone().unwrap_or_else(CliConfig::default_path);
    let command = cli
        .command
        .unwrap_or_else(|| Command::Sync(SyncArgs::default()));

    match command {
        Command::Sync(args) => commands::sync::run(config, &cli.paths, &args),
        Command::Status { json } => {
            commands::status::run(config, &cli.paths, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Dump => commands::config::dump(config, &config_path)?,
                ConfigAction::Validate => commands::config::validate(config, &cli.paths)?,
                ConfigAction::Path => commands::config::path(&config_path)?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
