//! Processing state: which notes were handled, and with which content.
//!
//! The state maps a note path (relative to the daily notes root) to the
//! content hash it had when last processed. A note whose current hash equals
//! the stored one is skipped unless the run is forced.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::writer::atomic_write;

/// Stored record for one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub content_hash: String,
    pub processed_at: DateTime<Utc>,
}

/// Note path → last processed hash and time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    #[serde(default)]
    notes: BTreeMap<String, StateEntry>,
    /// Set when an entry changed since load.
    #[serde(skip)]
    dirty: bool,
}

impl ProcessingState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the state file. Missing or unreadable JSON yields empty state.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file, starting fresh");
                return Ok(Self::new());
            }
            Err(e) => return Err(EngineError::read(path, e)),
        };

        match Self::parse(path, &raw) {
            Ok(state) => {
                debug!(path = %path.display(), tracked = state.len(), "Loaded state");
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, "State file is corrupt, every note will be reprocessed");
                Ok(Self::new())
            }
        }
    }

    fn parse(path: &Path, raw: &str) -> EngineResult<Self> {
        serde_json::from_str(raw).map_err(|source| EngineError::State {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the state atomically.
    pub fn save(&mut self, path: &Path) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| EngineError::State {
            path: path.to_path_buf(),
            source,
        })?;
        atomic_write(path, &(json + "\n"))?;
        self.dirty = false;
        debug!(path = %path.display(), tracked = self.len(), "Saved state");
        Ok(())
    }

    /// Returns true if the note was last processed with this exact hash.
    pub fn is_unchanged(&self, key: &str, hash: &str) -> bool {
        self.notes
            .get(key)
            .is_some_and(|entry| entry.content_hash == hash)
    }

    /// Records a successfully processed note.
    pub fn record(&mut self, key: impl Into<String>, hash: impl Into<String>, at: DateTime<Utc>) {
        self.notes.insert(
            key.into(),
            StateEntry {
                content_hash: hash.into(),
                processed_at: at,
            },
        );
        self.dirty = true;
    }

    /// Returns the stored entry for a note.
    pub fn get(&self, key: &str) -> Option<&StateEntry> {
        self.notes.get(key)
    }

    /// Most recent processing time across all notes.
    pub fn last_processed(&self) -> Option<DateTime<Utc>> {
        self.notes.values().map(|entry| entry.processed_at).max()
    }

    /// Local calendar date of the most recent processing time.
    pub fn last_processed_date(&self) -> Option<NaiveDate> {
        self.last_processed()
            .map(|ts| ts.with_timezone(&Local).date_naive())
    }

    /// True if entries were recorded since load or the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the number of tracked notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns true if no note is tracked.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// State key for a note: its path relative to the daily notes root.
pub fn state_key(root: &Path, path: &Path) -> String {
    let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, 0, 0).unwrap()
    }

    #[test]
    fn missing_file_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let state = ProcessingState::load(&dir.path().join("state.json")).unwrap();
        assert!(state.is_empty());
        assert!(!state.is_dirty());
    }

    #[test]
    fn corrupt_file_is_empty_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let state = ProcessingState::load(&path).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".notesync").join("state.json");

        let mut state = ProcessingState::new();
        state.record("2025-03-14.md", "abc", at(9));
        assert!(state.is_dirty());
        state.save(&path).unwrap();
        assert!(!state.is_dirty());

        let loaded = ProcessingState::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("2025-03-14.md").unwrap().content_hash, "abc");
        assert_eq!(loaded.get("2025-03-14.md").unwrap().processed_at, at(9));
    }

    #[test]
    fn unchanged_requires_same_hash() {
        let mut state = ProcessingState::new();
        state.record("a.md", "h1", at(9));
        assert!(state.is_unchanged("a.md", "h1"));
        assert!(!state.is_unchanged("a.md", "h2"));
        assert!(!state.is_unchanged("b.md", "h1"));
    }

    #[test]
    fn last_processed_is_max() {
        let mut state = ProcessingState::new();
        assert_eq!(state.last_processed(), None);
        state.record("a.md", "h", at(9));
        state.record("b.md", "h", at(17));
        state.record("c.md", "h", at(12));
        assert_eq!(state.last_processed(), Some(at(17)));
        assert_eq!(
            state.last_processed_date(),
            Some(at(17).with_timezone(&Local).date_naive())
        );
    }

    #[test]
    fn keys_are_relative_with_forward_slashes() {
        let root = Path::new("/vault/Daily Notes");
        let path = root.join("2025").join("2025-03-14.md");
        assert_eq!(state_key(root, &path), "2025/2025-03-14.md");
        assert_eq!(state_key(Path::new("/elsewhere"), Path::new("x.md")), "x.md");
    }
}
