//! The `sync` command.

use std::process::ExitCode;

use notesync_core::{OutputFormat, OutputFormatter, RunSummary};
use notesync_engine::SyncEngine;
use tracing::info;

use crate::cli::{PathArgs, SyncArgs};
use crate::config::CliConfig;
use crate::error::CliResult;

/// Runs a sync and prints its summary.
///
/// Exits non-zero only when the run was aborted; notes that failed are
/// listed in the summary and retried on the next run.
pub fn run(config: &CliConfig, paths: &PathArgs, args: &SyncArgs) -> CliResult<ExitCode> {
    let mut sync = config
        .to_sync_config(paths)?
        .with_dry_run(args.dry_run)
        .with_force(args.force);
    if let Some(scope) = args.requested_scope() {
        sync = sync.with_scope(scope);
    }
    info!(scope = %sync.scope, daily_notes = %sync.paths.daily_notes.display(), "Running sync");

    let summary = SyncEngine::new(sync).run()?;
    println!("{}", render(&summary, args.output_format())?);

    Ok(if summary.aborted.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Renders a summary in the requested format.
pub fn render(summary: &RunSummary, format: OutputFormat) -> CliResult<String> {
    let formatter = OutputFormatter::with_defaults();
    match format {
        OutputFormat::Tty => Ok(formatter.format_tty(summary)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&formatter.format_json(summary))?),
    }
}
