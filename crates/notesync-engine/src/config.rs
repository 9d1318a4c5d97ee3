//! Sync configuration.
//!
//! A [`SyncConfig`] is built once per run and handed to every component by
//! reference. Nothing in the engine reads environment variables.

use std::path::{Path, PathBuf};

use notesync_core::Scope;

/// Default folder for people whose company is unknown.
pub const DEFAULT_TRIAGE_FOLDER: &str = "Triage";

/// Default extension of eligible notes.
pub const DEFAULT_NOTE_EXTENSION: &str = "md";

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    /// Root of the dated daily notes, walked recursively.
    pub daily_notes: PathBuf,
    /// Where meeting notes are written.
    pub meeting_notes: PathBuf,
    /// Root of the person hubs (one folder per company).
    pub person_hubs: PathBuf,
    /// Where company hubs are written.
    pub company_hubs: PathBuf,
    /// The master task list holding the Backlog section.
    pub task_list: PathBuf,
    /// JSON processing state.
    pub state_file: PathBuf,
    /// Markdown audit log.
    pub audit_log: PathBuf,
}

impl SyncPaths {
    /// Default layout under a vault root.
    pub fn under(vault: impl AsRef<Path>) -> Self {
        let vault = vault.as_ref();
        Self {
            daily_notes: vault.join("Daily Notes"),
            meeting_notes: vault.join("Meetings"),
            person_hubs: vault.join("People"),
            company_hubs: vault.join("Companies"),
            task_list: vault.join("Tasks.md"),
            state_file: vault.join(".notesync").join("state.json"),
            audit_log: vault.join(".notesync").join("audit.md"),
        }
    }
}

/// Sync configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub paths: SyncPaths,

    /// Which dated notes to consider.
    pub scope: Scope,

    /// Compute everything, write nothing.
    pub dry_run: bool,

    /// Reprocess notes even when their hash is unchanged.
    pub force: bool,

    /// Folder under `person_hubs` for people without a company.
    pub triage_folder: String,

    /// Extension (without dot) of eligible notes.
    pub note_extension: String,
}

impl SyncConfig {
    /// Creates a configuration with the given paths and defaults for the rest.
    pub fn new(paths: SyncPaths) -> Self {
        Self {
            paths,
            scope: Scope::default(),
            dry_run: false,
            force: false,
            triage_folder: DEFAULT_TRIAGE_FOLDER.to_string(),
            note_extension: DEFAULT_NOTE_EXTENSION.to_string(),
        }
    }

    /// Creates a configuration with the default layout under a vault root.
    pub fn for_vault(vault: impl AsRef<Path>) -> Self {
        Self::new(SyncPaths::under(vault))
    }

    /// Builder: set the scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Builder: set dry-run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder: set force.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Builder: set the triage folder name.
    pub fn with_triage_folder(mut self, folder: impl Into<String>) -> Self {
        self.triage_folder = folder.into();
        self
    }

    /// Builder: set the note extension. A leading dot is ignored.
    pub fn with_note_extension(mut self, extension: impl Into<String>) -> Self {
        self.note_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Returns true if `path` has the configured note extension.
    pub fn is_note(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.note_extension.as_str()))
    }
}
