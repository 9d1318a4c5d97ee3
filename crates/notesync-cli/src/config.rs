//! CLI configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/notesync/config.toml` by default.
//!
//! Every location is resolved in this order: command-line flag (or its
//! environment variable), then the `[paths]` table, then the default layout
//! under the vault root. Relative paths in the file are taken relative to
//! the vault.

use std::path::{Path, PathBuf};

use notesync_core::Scope;
use notesync_engine::{DEFAULT_NOTE_EXTENSION, DEFAULT_TRIAGE_FOLDER, SyncConfig, SyncPaths};
use serde::{Deserialize, Serialize};

use crate::cli::PathArgs;
use crate::error::{CliError, CliResult};

/// Configuration for the notesync CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Debug mode.
    pub debug: bool,

    /// Input and output locations.
    pub paths: PathSettings,

    /// Sync defaults.
    pub sync: SyncSettings,
}

/// Location settings. Unset entries default to a path under the vault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub vault: Option<PathBuf>,
    pub daily_notes: Option<PathBuf>,
    pub meeting_notes: Option<PathBuf>,
    pub person_hubs: Option<PathBuf>,
    pub company_hubs: Option<PathBuf>,
    pub task_list: Option<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub audit_log: Option<PathBuf>,
}

/// Sync defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Scope used when `sync` gets no `--scope`.
    pub scope: String,

    /// Folder for people whose company is unknown.
    pub triage_folder: String,

    /// Extension of eligible notes.
    pub note_extension: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            scope: Scope::default().to_string(),
            triage_folder: DEFAULT_TRIAGE_FOLDER.to_string(),
            note_extension: DEFAULT_NOTE_EXTENSION.to_string(),
        }
    }
}

impl SyncSettings {
    /// Parses the configured default scope.
    pub fn scope(&self) -> CliResult<Scope> {
        self.scope
            .parse()
            .map_err(|e| CliError::Config(format!("[sync] scope: {}", e)))
    }
}

impl CliConfig {
    /// Loads configuration from the default path, or defaults if it is absent.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> CliResult<Self> {
        toml::from_str(content).map_err(|e| CliError::Config(format!("failed to parse config: {}", e)))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notesync")
    }

    /// Returns the default vault root.
    pub fn default_vault() -> PathBuf {
        dirs::document_dir()
            .map(|dir| dir.join("Notes"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolves every location from flags, this file and the vault defaults.
    pub fn resolve_paths(&self, flags: &PathArgs) -> SyncPaths {
        let vault = flags
            .vault
            .clone()
            .or_else(|| self.paths.vault.clone())
            .unwrap_or_else(Self::default_vault);
        let defaults = SyncPaths::under(&vault);

        let pick = |flag: &Option<PathBuf>, file: &Option<PathBuf>, default: PathBuf| {
            flag.clone()
                .or_else(|| file.as_ref().map(|p| vault.join(p)))
                .unwrap_or(default)
        };
        let file = &self.paths;
        SyncPaths {
            daily_notes: pick(&flags.daily_notes, &file.daily_notes, defaults.daily_notes),
            meeting_notes: pick(&flags.meeting_notes, &file.meeting_notes, defaults.meeting_notes),
            person_hubs: pick(&flags.person_hubs, &file.person_hubs, defaults.person_hubs),
            company_hubs: pick(&flags.company_hubs, &file.company_hubs, defaults.company_hubs),
            task_list: pick(&flags.task_list, &file.task_list, defaults.task_list),
            state_file: pick(&flags.state_file, &file.state_file, defaults.state_file),
            audit_log: pick(&flags.audit_log, &file.audit_log, defaults.audit_log),
        }
    }

    /// Builds the engine configuration. The scope is left at the file default.
    pub fn to_sync_config(&self, flags: &PathArgs) -> CliResult<SyncConfig> {
        Ok(SyncConfig::new(self.resolve_paths(flags))
            .with_scope(self.sync.scope()?)
            .with_triage_folder(self.sync.triage_folder.as_str())
            .with_note_extension(self.sync.note_extension.as_str()))
    }
}
