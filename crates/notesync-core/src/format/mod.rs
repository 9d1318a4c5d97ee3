//! Output formatting for run summaries.
//!
//! Two output formats:
//! - **TTY**: aligned, human-readable lines
//! - **JSON**: the summary serialized as-is, plus a `success` flag
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use notesync_core::format::OutputFormatter;
//! use notesync_core::{DateRange, RunSummary};
//!
//! let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
//! let summary = RunSummary::new(DateRange::day(day, "today"), false, false);
//! let text = OutputFormatter::with_defaults().format_tty(&summary);
//! assert!(text.starts_with("today (2025-03-14 .. 2025-03-14)"));
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::summary::{EntityCounts, RunSummary, StatusReport};

/// Width of the label column in TTY output.
const LABEL_WIDTH: usize = 11;

/// The output format for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable terminal output.
    #[default]
    Tty,
    /// Machine-readable JSON output.
    Json,
}

/// Configuration options for output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOptions {
    /// List per-note failures under the counters.
    pub show_failures: bool,
    /// Maximum length for failure messages (truncated with ellipsis).
    pub max_message_length: Option<usize>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            show_failures: true,
            max_message_length: Some(120),
        }
    }
}

/// JSON output format for machine consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// False if any note failed or the run was aborted.
    pub success: bool,
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// Output formatter for run summaries.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    options: FormatOptions,
}

impl OutputFormatter {
    /// Creates a new OutputFormatter with the given options.
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Creates a new OutputFormatter with default options.
    pub fn with_defaults() -> Self {
        Self::new(FormatOptions::default())
    }

    /// Formats a summary for TTY output.
    pub fn format_tty(&self, summary: &RunSummary) -> String {
        let mut header = summary.range.to_string();
        if summary.dry_run {
            header.push_str(" [dry run]");
        }
        if summary.force {
            header.push_str(" [forced]");
        }

        let notes = &summary.notes;
        let tasks = &summary.tasks;
        let mut lines = vec![
            header,
            line(
                "notes",
                format!(
                    "{} seen, {} processed, {} skipped, {} failed",
                    notes.seen, notes.processed, notes.skipped, notes.failed
                ),
            ),
            line("meetings", counts(&summary.meetings)),
            line("people", counts(&summary.people)),
            line("companies", counts(&summary.companies)),
            line(
                "tasks",
                format!(
                    "{} added, {} duplicate, {} swept",
                    tasks.added, tasks.duplicate, tasks.swept
                ),
            ),
            line("attendees", format!("{} linked", summary.attendees_linked)),
        ];

        if self.options.show_failures {
            for failure in &summary.failures {
                lines.push(line(
                    "failed",
                    format!(
                        "{} [{}] {}",
                        failure.path,
                        failure.stage,
                        self.truncate(&failure.message)
                    ),
                ));
            }
        }
        if let Some(reason) = &summary.aborted {
            lines.push(line("aborted", self.truncate(reason).into_owned()));
        }

        lines.join("\n")
    }

    /// Formats a summary for JSON output.
    pub fn format_json(&self, summary: &RunSummary) -> JsonOutput {
        JsonOutput {
            success: summary.is_success(),
            summary: summary.clone(),
        }
    }

    /// Formats a status report for TTY output.
    pub fn format_status_tty(&self, status: &StatusReport) -> String {
        let last = status
            .last_processed
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        [
            line("tracked", format!("{} notes", status.tracked)),
            line("last run", last),
            line("next", status.since_last_run.to_string()),
        ]
        .join("\n")
    }

    fn truncate<'a>(&self, message: &'a str) -> Cow<'a, str> {
        match self.options.max_message_length {
            Some(max) => ellipsis(message, max),
            None => Cow::Borrowed(message),
        }
    }
}

fn line(label: &str, value: String) -> String {
    format!("{:<width$}{}", format!("{}:", label), value, width = LABEL_WIDTH)
}

fn counts(counts: &EntityCounts) -> String {
    format!(
        "{} created, {} updated, {} unchanged, {} skipped",
        counts.created, counts.updated, counts.unchanged, counts.skipped
    )
}

/// Truncates a string with ellipsis if it exceeds the given length.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }

    let char_count = s.chars().count();

    if char_count <= max_len {
        return Cow::Borrowed(s);
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod ellipsis_tests {
        use super::*;

        #[test]
        fn short_string_unchanged() {
            assert_eq!(ellipsis("hello", 10), "hello");
        }

        #[test]
        fn exact_length_unchanged() {
            assert_eq!(ellipsis("hello", 5), "hello");
        }

        #[test]
        fn long_string_truncated() {
            assert_eq!(ellipsis("hello world", 8), "hello...");
        }

        #[test]
        fn zero_length() {
            assert_eq!(ellipsis("hello", 0), "");
        }

        #[test]
        fn multibyte_counts_chars() {
            assert_eq!(ellipsis("ééééé", 4), "é...");
        }
    }

    mod output_format {
        use super::*;

        #[test]
        fn default_is_tty() {
            assert_eq!(OutputFormat::default(), OutputFormat::Tty);
        }

        #[test]
        fn serde_names() {
            let json = serde_json::to_string(&OutputFormat::Json).unwrap();
            assert_eq!(json, "\"json\"");
        }
    }

    mod labels {
        use super::*;

        #[test]
        fn label_column_is_aligned() {
            assert_eq!(line("notes", "x".to_string()), "notes:     x");
            assert_eq!(line("companies", "x".to_string()), "companies: x");
        }
    }
}
