//! Engine error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during a sync run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Reading an input or artifact failed.
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// Writing an artifact failed.
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Walking a directory tree failed.
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// The state file could not be encoded or decoded.
    #[error("invalid state file {}: {source}", path.display())]
    State {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A note or artifact could not be interpreted.
    #[error("{}: {message}", path.display())]
    Note { path: PathBuf, message: String },
}

impl EngineError {
    /// Creates a read error.
    pub fn read(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Read {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a write error.
    pub fn write(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Write {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a note error.
    pub fn note(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Note {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run.
    ///
    /// An unwritable target means the output location is misconfigured, so
    /// every later note would fail the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Config { .. })
    }
}
