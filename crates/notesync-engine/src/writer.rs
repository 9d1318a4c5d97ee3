//! Artifact writes with dry-run gating.
//!
//! Every artifact goes through [`ArtifactWriter`]. Real writes land in a
//! temporary file next to the target and are renamed over it, so a crash
//! never leaves a half-written file under the real name. In dry-run mode the
//! content is staged in memory instead, and later reads in the same run see
//! the staged version.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use notesync_core::Outcome;
use tempfile::NamedTempFile;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{EngineError, EngineResult};

/// Writes artifacts, or stages them when running dry.
#[derive(Debug, Default)]
pub struct ArtifactWriter {
    dry_run: bool,
    /// Would-be content of files written during a dry run.
    staged: HashMap<PathBuf, String>,
    /// Number of created or updated files.
    writes: usize,
}

impl ArtifactWriter {
    /// Creates a writer.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Returns true if writes are staged in memory only.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Number of files created or updated so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Returns true if the file exists on disk or was staged.
    pub fn exists(&self, path: &Path) -> bool {
        self.staged.contains_key(path) || path.is_file()
    }

    /// Reads a file, preferring staged content. A missing file is `None`.
    pub fn read(&self, path: &Path) -> EngineResult<Option<String>> {
        if let Some(content) = self.staged.get(path) {
            return Ok(Some(content.clone()));
        }
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            // A path below a regular file cannot exist either.
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                Ok(None)
            }
            Err(e) => Err(EngineError::read(path, e)),
        }
    }

    /// Writes `content` to `path` unless the file already holds exactly that.
    pub fn write(&mut self, path: &Path, content: &str) -> EngineResult<Outcome> {
        let outcome = match self.read(path)? {
            Some(existing) if existing == content => {
                trace!(path = %path.display(), "Content unchanged, skipping write");
                return Ok(Outcome::Unchanged);
            }
            Some(_) => Outcome::Updated,
            None => Outcome::Created,
        };

        if self.dry_run {
            debug!(path = %path.display(), ?outcome, "Dry run, staging write");
            self.staged.insert(path.to_path_buf(), content.to_string());
        } else {
            atomic_write(path, content)?;
            debug!(path = %path.display(), ?outcome, "Wrote artifact");
        }
        self.writes += 1;
        Ok(outcome)
    }

    /// Writes `content` only if `path` does not exist yet.
    pub fn create_new(&mut self, path: &Path, content: &str) -> EngineResult<Outcome> {
        if self.exists(path) {
            return Ok(Outcome::Skipped);
        }
        self.write(path, content)
    }

    /// Lists files under `root` with the given extension, staged ones included.
    pub fn list_files(&self, root: &Path, extension: &str) -> EngineResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        if root.is_dir() {
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry?;
                if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                    files.push(entry.into_path());
                }
            }
        }
        for path in self.staged.keys() {
            if path.starts_with(root) && has_extension(path, extension) && !files.contains(path) {
                files.push(path.clone());
            }
        }
        files.sort();
        Ok(files)
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Replaces `path` with `content` via a temporary file in the same directory.
pub fn atomic_write(path: &Path, content: &str) -> EngineResult<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| EngineError::write(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| EngineError::write(path, e))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| EngineError::write(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| EngineError::write(path, e))?;
    tmp.persist(path).map_err(|e| EngineError::write(path, e.error))?;
    Ok(())
}
