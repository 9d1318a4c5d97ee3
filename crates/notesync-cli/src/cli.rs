//! Command-line interface definition.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use notesync_core::{OutputFormat, Scope};

/// notesync - Turn daily notes into meetings, people and a task backlog
#[derive(Debug, Parser)]
#[command(name = "notesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "NOTESYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Location overrides. Each beats the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Vault root; every other location defaults to a path under it
    #[arg(long, env = "NOTESYNC_VAULT", global = true)]
    pub vault: Option<PathBuf>,

    /// Directory of dated daily notes
    #[arg(long, env = "NOTESYNC_DAILY_NOTES", global = true)]
    pub daily_notes: Option<PathBuf>,

    /// Directory for meeting notes
    #[arg(long, env = "NOTESYNC_MEETING_NOTES", global = true)]
    pub meeting_notes: Option<PathBuf>,

    /// Root of the person hubs
    #[arg(long, env = "NOTESYNC_PERSON_HUBS", global = true)]
    pub person_hubs: Option<PathBuf>,

    /// Directory for company hubs
    #[arg(long, env = "NOTESYNC_COMPANY_HUBS", global = true)]
    pub company_hubs: Option<PathBuf>,

    /// Master task list holding the Backlog section
    #[arg(long, env = "NOTESYNC_TASK_LIST", global = true)]
    pub task_list: Option<PathBuf>,

    /// Processing state file
    #[arg(long, env = "NOTESYNC_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    /// Audit log file
    #[arg(long, env = "NOTESYNC_AUDIT_LOG", global = true)]
    pub audit_log: Option<PathBuf>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process daily notes (the default)
    Sync(SyncArgs),

    /// Show what the processing state knows
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for a sync run.
#[derive(Debug, Clone, Default, Args)]
pub struct SyncArgs {
    /// today, this-week, this-month, since-last-run, all, or START..END
    #[arg(long, short)]
    pub scope: Option<Scope>,

    /// First day of an explicit range (YYYY-MM-DD)
    #[arg(long, conflicts_with = "scope")]
    pub from: Option<NaiveDate>,

    /// Last day of an explicit range (YYYY-MM-DD)
    #[arg(long, conflicts_with = "scope")]
    pub to: Option<NaiveDate>,

    /// Compute and report everything, write nothing
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Reprocess notes even if unchanged since the last run
    #[arg(long, short)]
    pub force: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    /// Scope requested on the command line, if any.
    ///
    /// `--from`/`--to` build an explicit range; a missing bound makes it
    /// invalid, which resolves to today.
    pub fn requested_scope(&self) -> Option<Scope> {
        if self.from.is_some() || self.to.is_some() {
            return Some(Scope::range(self.from, self.to));
        }
        self.scope
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Tty
        }
    }
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn parses_sync_flags() {
        let cli = Cli::try_parse_from([
            "notesync", "--vault", "/v", "sync", "--scope", "this-week", "--dry-run", "--json",
        ])
        .unwrap();
        assert_eq!(cli.paths.vault, Some(PathBuf::from("/v")));
        let Some(Command::Sync(args)) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.requested_scope(), Some(Scope::ThisWeek));
        assert!(args.dry_run);
        assert_eq!(args.output_format(), OutputFormat::Json);
    }

    #[test]
    fn from_to_build_range() {
        let cli = Cli::try_parse_from(["notesync", "sync", "--from", "2025-03-01", "--to", "2025-03-07"]).unwrap();
        let Some(Command::Sync(args)) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(
            args.requested_scope(),
            Some(Scope::range(Some(date("2025-03-01")), Some(date("2025-03-07"))))
        );
    }

    #[test]
    fn scope_and_range_conflict() {
        let result = Cli::try_parse_from(["notesync", "sync", "--scope", "all", "--from", "2025-03-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn bad_scope_is_rejected() {
        assert!(Cli::try_parse_from(["notesync", "sync", "--scope", "fortnight"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["notesync", "status", "-v", "--task-list", "/t.md"]).unwrap();
        assert!(cli.debug);
        assert_eq!(cli.paths.task_list, Some(PathBuf::from("/t.md")));
    }
}
