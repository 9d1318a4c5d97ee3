//! notesync CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use notesync_cli::{Cli, load_config, run};
use notesync_core::{TracingConfig, init_tracing};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(e.exit_status());
        }
    };

    let tracing = TracingConfig::for_flags(cli.debug || config.debug, cli.log_json);
    if let Err(e) = init_tracing(&tracing) {
        eprintln!("warning: {}", e);
    }

    match run(cli, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_status())
        }
    }
}
