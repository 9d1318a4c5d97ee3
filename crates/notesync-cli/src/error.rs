//! CLI error types.

use std::fmt;

use notesync_engine::EngineError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or flag error.
    Config(String),
    /// The sync engine failed.
    Engine(EngineError),
    /// IO error.
    Io(std::io::Error),
    /// Rendering output failed.
    Output(String),
}

impl CliError {
    /// Process exit status: 2 for configuration problems, 1 otherwise.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Engine(e) if e.is_fatal() => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Engine(err) => write!(f, "sync failed: {}", err),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Output(msg) => write!(f, "output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CliError::Config("bad scope".to_string()).to_string(),
            "configuration error: bad scope"
        );
        let engine = CliError::from(EngineError::config("no daily notes"));
        assert_eq!(
            engine.to_string(),
            "sync failed: configuration error: no daily notes"
        );
    }

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::Config(String::new()).exit_status(), 2);
        assert_eq!(CliError::from(EngineError::config("x")).exit_status(), 2);
        let io = std::io::Error::other("boom");
        assert_eq!(CliError::from(io).exit_status(), 1);
    }
}
