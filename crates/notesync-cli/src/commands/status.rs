//! The `status` command.

use notesync_core::{OutputFormatter, StatusReport};
use notesync_engine::SyncEngine;

use crate::cli::PathArgs;
use crate::config::CliConfig;
use crate::error::CliResult;

/// Prints what the processing state knows.
pub fn run(config: &CliConfig, paths: &PathArgs, json: bool) -> CliResult<()> {
    let engine = SyncEngine::new(config.to_sync_config(paths)?);
    let status = engine.status()?;
    println!("{}", render(&status, json)?);
    Ok(())
}

/// Renders a status report as text or JSON.
pub fn render(status: &StatusReport, json: bool) -> CliResult<String> {
    if json {
        Ok(serde_json::to_string_pretty(status)?)
    } else {
        Ok(OutputFormatter::with_defaults().format_status_tty(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use notesync_core::DateRange;

    #[test]
    fn renders_json() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let status = StatusReport {
            tracked: 4,
            last_processed: None,
            since_last_run: DateRange::day(day, "since-last-run"),
        };
        let value: serde_json::Value = serde_json::from_str(&render(&status, true).unwrap()).unwrap();
        assert_eq!(value["tracked"], 4);
        assert_eq!(value["last_processed"], serde_json::Value::Null);
        assert_eq!(value["since_last_run"]["start"], "2025-03-14");
    }
}
