//! Markdown audit log: one block per run.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use notesync_core::{EntityCounts, RunSummary};
use tracing::debug;

use crate::error::EngineResult;
use crate::writer::ArtifactWriter;

const AUDIT_HEADER: &str = "# notesync audit log\n";

fn entity_line(out: &mut String, label: &str, counts: &EntityCounts) {
    let _ = writeln!(
        out,
        "- {}: {} created, {} updated, {} unchanged, {} skipped",
        label, counts.created, counts.updated, counts.unchanged, counts.skipped
    );
}

/// Renders the audit block for one run.
pub fn render_entry(summary: &RunSummary, at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(out);
    let _ = writeln!(out, "- scope: {}", summary.range);

    let mut flags = Vec::new();
    if summary.force {
        flags.push("force");
    }
    if summary.dry_run {
        flags.push("dry-run");
    }
    if !flags.is_empty() {
        let _ = writeln!(out, "- flags: {}", flags.join(", "));
    }

    let notes = &summary.notes;
    let _ = writeln!(
        out,
        "- notes: {} seen, {} processed, {} skipped, {} failed",
        notes.seen, notes.processed, notes.skipped, notes.failed
    );
    entity_line(&mut out, "meetings", &summary.meetings);
    entity_line(&mut out, "people", &summary.people);
    entity_line(&mut out, "companies", &summary.companies);
    let tasks = &summary.tasks;
    let _ = writeln!(
        out,
        "- tasks: {} added, {} duplicate, {} swept",
        tasks.added, tasks.duplicate, tasks.swept
    );
    let _ = writeln!(out, "- attendees linked: {}", summary.attendees_linked);

    for failure in &summary.failures {
        let _ = writeln!(
            out,
            "- failed: {} ({}): {}",
            failure.path, failure.stage, failure.message
        );
    }
    if let Some(reason) = &summary.aborted {
        let _ = writeln!(out, "- aborted: {}", reason);
    }
    out
}

/// Appends an entry to the log with a read-modify-atomic-rewrite.
pub fn append_entry(
    writer: &mut ArtifactWriter,
    path: &Path,
    summary: &RunSummary,
    at: DateTime<Utc>,
) -> EngineResult<()> {
    let mut log = writer
        .read(path)?
        .unwrap_or_else(|| AUDIT_HEADER.to_string());
    if !log.ends_with('\n') {
        log.push('\n');
    }
    log.push('\n');
    log.push_str(&render_entry(summary, at));
    writer.write(path, &log)?;
    debug!(path = %path.display(), "Appended audit entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use notesync_core::{DateRange, Outcome};
    use std::fs;
    use tempfile::TempDir;

    fn summary() -> RunSummary {
        let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let mut summary = RunSummary::new(DateRange::day(day, "today"), false, true);
        summary.notes.seen = 2;
        summary.notes.processed = 1;
        summary.notes.skipped = 1;
        summary.meetings.record(Outcome::Created);
        summary.tasks.added = 2;
        summary
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 17, minute, 0).unwrap()
    }

    #[test]
    fn entry_lists_every_counter() {
        let mut summary = summary();
        summary.fail("2025-03-14.md", "contacts", "boom");
        assert_eq!(
            render_entry(&summary, at(5)),
            "\
## 2025-03-14 17:05:00 UTC

- scope: today (2025-03-14 .. 2025-03-14)
- flags: force
- notes: 2 seen, 1 processed, 1 skipped, 0 failed
- meetings: 1 created, 0 updated, 0 unchanged, 0 skipped
- people: 0 created, 0 updated, 0 unchanged, 0 skipped
- companies: 0 created, 0 updated, 0 unchanged, 0 skipped
- tasks: 2 added, 0 duplicate, 0 swept
- attendees linked: 0
- failed: 2025-03-14.md (contacts): boom
"
        );
    }

    #[test]
    fn entries_accumulate() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".notesync").join("audit.md");
        let mut writer = ArtifactWriter::new(false);

        append_entry(&mut writer, &path, &summary(), at(5)).unwrap();
        append_entry(&mut writer, &path, &summary(), at(6)).unwrap();

        let log = fs::read_to_string(&path).unwrap();
        assert!(log.starts_with("# notesync audit log\n\n## 2025-03-14 17:05:00 UTC\n"));
        assert_eq!(log.matches("\n## ").count(), 2);
        assert!(log.contains("\n\n## 2025-03-14 17:06:00 UTC\n"));
    }
}
