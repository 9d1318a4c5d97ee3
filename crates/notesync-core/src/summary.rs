//! Run result counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::range::DateRange;

/// What happened to one artifact during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A new file was (or in dry-run, would be) written.
    Created,
    /// An existing file was rewritten with new content.
    Updated,
    /// The file already had exactly this content.
    Unchanged,
    /// Left alone on purpose (e.g. an existing company hub).
    Skipped,
}

impl Outcome {
    /// True if the outcome touches the disk.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Create/update/skip counters for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl EntityCounts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped
    }
}

/// Counters for the input notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteCounts {
    /// Eligible notes found in range.
    pub seen: usize,
    pub processed: usize,
    /// Hash matched the stored state.
    pub skipped: usize,
    /// At least one sub-step failed; retried next run.
    pub failed: usize,
}

/// Counters for the task backlog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub added: usize,
    pub duplicate: usize,
    pub swept: usize,
}

/// A sub-step failure for one note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFailure {
    pub path: String,
    pub stage: String,
    pub message: String,
}

/// Structured result of one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub range: DateRange,
    pub dry_run: bool,
    pub force: bool,
    pub notes: NoteCounts,
    pub meetings: EntityCounts,
    pub people: EntityCounts,
    pub companies: EntityCounts,
    pub tasks: TaskCounts,
    /// Attendee strings rewritten into hub links.
    pub attendees_linked: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<NoteFailure>,
    /// Set when a fatal error stopped the run early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl RunSummary {
    pub fn new(range: DateRange, dry_run: bool, force: bool) -> Self {
        Self {
            range,
            dry_run,
            force,
            notes: NoteCounts::default(),
            meetings: EntityCounts::default(),
            people: EntityCounts::default(),
            companies: EntityCounts::default(),
            tasks: TaskCounts::default(),
            attendees_linked: 0,
            failures: Vec::new(),
            aborted: None,
        }
    }

    /// Records a per-note failure.
    pub fn fail(&mut self, path: impl Into<String>, stage: impl Into<String>, message: impl Into<String>) {
        self.failures.push(NoteFailure {
            path: path.into(),
            stage: stage.into(),
            message: message.into(),
        });
    }

    /// True if the run completed and every note succeeded.
    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.failures.is_empty()
    }
}

/// Snapshot of the processing state, for `notesync status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Number of notes with a stored hash.
    pub tracked: usize,
    pub last_processed: Option<DateTime<Utc>>,
    /// What a `since-last-run` sync would cover today.
    pub since_last_run: DateRange,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn summary() -> RunSummary {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        RunSummary::new(DateRange::day(day, "today"), false, false)
    }

    #[test]
    fn counts_record_outcomes() {
        let mut counts = EntityCounts::default();
        counts.record(Outcome::Created);
        counts.record(Outcome::Created);
        counts.record(Outcome::Unchanged);
        counts.record(Outcome::Skipped);
        assert_eq!(counts.created, 2);
        assert_eq!(counts.unchanged, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn outcome_is_write() {
        assert!(Outcome::Created.is_write());
        assert!(Outcome::Updated.is_write());
        assert!(!Outcome::Unchanged.is_write());
        assert!(!Outcome::Skipped.is_write());
    }

    #[test]
    fn success_tracks_failures_and_abort() {
        let mut s = summary();
        assert!(s.is_success());
        s.fail("2025-03-14.md", "contacts", "boom");
        assert!(!s.is_success());

        let mut s = summary();
        s.aborted = Some("disk full".to_string());
        assert!(!s.is_success());
    }

    #[test]
    fn serde_skips_empty_optionals() {
        let json = serde_json::to_value(summary()).unwrap();
        assert!(json.get("failures").is_none());
        assert!(json.get("aborted").is_none());
        assert_eq!(json["range"]["label"], "today");
    }
}
