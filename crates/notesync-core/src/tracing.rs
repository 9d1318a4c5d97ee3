//! Log setup for the notesync binary.
//!
//! Logs always go to stderr; stdout carries only the run summary. The sync
//! loop wraps each daily note in a `note` span with a `path` field, and both
//! formats print it so every line can be traced back to its note.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Failed to parse env filter directive
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// How log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One compact line per event, no timestamp.
    #[default]
    Text,
    /// JSON lines with the current note span attached.
    Json,
}

/// Logging preset chosen from the command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for notesync's crates when `RUST_LOG` is not set.
    pub level: Level,
    pub format: LogFormat,
    /// Adds target, file and line to every event.
    pub verbose: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Text,
            verbose: false,
        }
    }
}

impl TracingConfig {
    /// Preset for `--debug` and `--log-json`.
    ///
    /// JSON logs default to `info` so the start and finish events of a run
    /// are always shipped; `--debug` lowers either format to `debug`.
    #[must_use]
    pub fn for_flags(debug: bool, json: bool) -> Self {
        let level = match (debug, json) {
            (true, _) => Level::DEBUG,
            (false, true) => Level::INFO,
            (false, false) => Level::WARN,
        };
        Self {
            level,
            format: if json { LogFormat::Json } else { LogFormat::Text },
            verbose: debug,
        }
    }

    /// Filter used when `RUST_LOG` is unset.
    ///
    /// Targets match by prefix, so `notesync` covers every `notesync_*` crate
    /// and keeps dependencies quiet.
    pub fn directive(&self) -> String {
        format!("notesync={}", self.level.as_str().to_ascii_lowercase())
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the preset's level.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TracingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.directive())?,
    };
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .without_time()
                .with_target(config.verbose)
                .with_file(config.verbose)
                .with_line_number(config.verbose);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
        LogFormat::Json => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_file(config.verbose)
                .with_line_number(config.verbose);
            tracing::subscriber::set_global_default(registry.with(layer))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_quiet_text() {
        let config = TracingConfig::default();
        assert_eq!(config, TracingConfig::for_flags(false, false));
        assert_eq!(config.directive(), "notesync=warn");
    }

    #[test]
    fn debug_flag_is_verbose() {
        let config = TracingConfig::for_flags(true, false);
        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Text);
        assert!(config.verbose);
        assert_eq!(config.directive(), "notesync=debug");
    }

    #[test]
    fn json_defaults_to_info() {
        let config = TracingConfig::for_flags(false, true);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.verbose);

        let debug = TracingConfig::for_flags(true, true);
        assert_eq!(debug.level, Level::DEBUG);
        assert_eq!(debug.format, LogFormat::Json);
    }
}
