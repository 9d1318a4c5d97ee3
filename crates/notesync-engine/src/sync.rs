//! The sync run: walk the daily notes and materialise every artifact.
//!
//! Notes are handled one at a time in walk order. Within a note the steps
//! always run meetings, then contacts, then tasks; a failing step is recorded
//! and the next one still runs. A fatal error (unwritable output, bad
//! configuration) stops the loop, but whatever completed before it is still
//! committed to state and the audit log.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, Utc};
use notesync_core::{
    ContactKind, DateRange, NoteFile, RunSummary, Scope, StatusReport, date_from_filename,
    extract_contacts, extract_meetings, resolve_range,
};
use tracing::{debug, error, info, info_span, trace, warn};
use walkdir::WalkDir;

use crate::audit::append_entry;
use crate::backlog::{Backlog, collect_tasks};
use crate::config::SyncConfig;
use crate::error::{EngineError, EngineResult};
use crate::hub::HubWriter;
use crate::linker::HubIndex;
use crate::meetings::{MeetingNote, write_meeting};
use crate::state::{ProcessingState, state_key};
use crate::writer::ArtifactWriter;

/// Runs syncs against one configuration.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs a sync as of now.
    pub fn run(&self) -> EngineResult<RunSummary> {
        self.run_at(Local::now().date_naive(), Utc::now())
    }

    /// Runs a sync with an explicit clock.
    ///
    /// Errors are only returned when the run cannot start or its results
    /// cannot be committed; a fatal error during the note loop is reported
    /// through [`RunSummary::aborted`] instead.
    pub fn run_at(&self, today: NaiveDate, now: DateTime<Utc>) -> EngineResult<RunSummary> {
        let config = &self.config;
        let paths = &config.paths;

        let mut state = ProcessingState::load(&paths.state_file)?;
        let range = resolve_range(config.scope, today, state.last_processed_date());
        info!(
            range = %range,
            dry_run = config.dry_run,
            force = config.force,
            tracked = state.len(),
            "Starting sync"
        );

        let mut summary = RunSummary::new(range.clone(), config.dry_run, config.force);
        let mut writer = ArtifactWriter::new(config.dry_run);
        let candidates = self.candidates(&range)?;
        let index = HubIndex::build(&writer, &paths.person_hubs, &config.note_extension)?;

        for path in candidates {
            let key = state_key(&paths.daily_notes, &path);
            let span = info_span!("note", path = %key);
            let _enter = span.enter();
            summary.notes.seen += 1;

            let note = match fs::read_to_string(&path) {
                Ok(text) => NoteFile::new(&path, text),
                Err(e) => {
                    warn!(error = %e, "Could not read note");
                    summary.notes.failed += 1;
                    summary.fail(&key, "read", EngineError::read(&path, e).to_string());
                    continue;
                }
            };
            let Some(note) = note else {
                continue;
            };

            if !config.force && state.is_unchanged(&key, &note.hash) {
                debug!("Unchanged since last run, skipping");
                summary.notes.skipped += 1;
                continue;
            }

            match self.process_note(&mut writer, &index, &note, &key, &mut summary) {
                Ok(true) => {
                    state.record(&key, &note.hash, now);
                    summary.notes.processed += 1;
                }
                Ok(false) => {
                    summary.notes.failed += 1;
                }
                Err(e) => {
                    error!(error = %e, "Fatal error, stopping run");
                    summary.notes.failed += 1;
                    summary.aborted = Some(e.to_string());
                    break;
                }
            }
        }

        if summary.aborted.is_none() {
            let backlog = Backlog::new(&paths.task_list);
            match backlog.sweep(&mut writer, now.with_timezone(&Local)) {
                Ok(swept) => summary.tasks.swept = swept,
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Fatal error during sweep");
                    summary.aborted = Some(e.to_string());
                }
                Err(e) => {
                    warn!(error = %e, "Backlog sweep failed");
                    summary.fail(paths.task_list.display().to_string(), "sweep", e.to_string());
                }
            }
        }

        let did_work = state.is_dirty()
            || summary.tasks.swept > 0
            || !summary.failures.is_empty()
            || summary.aborted.is_some();
        if writer.is_dry_run() {
            debug!(would_write = writer.writes(), "Dry run, nothing persisted");
        } else if did_work {
            append_entry(&mut writer, &paths.audit_log, &summary, now)?;
            state.save(&paths.state_file)?;
        }

        info!(
            processed = summary.notes.processed,
            skipped = summary.notes.skipped,
            failed = summary.notes.failed,
            writes = writer.writes(),
            "Sync finished"
        );
        Ok(summary)
    }

    /// Reports the stored state as of today.
    pub fn status(&self) -> EngineResult<StatusReport> {
        self.status_at(Local::now().date_naive())
    }

    pub fn status_at(&self, today: NaiveDate) -> EngineResult<StatusReport> {
        let state = ProcessingState::load(&self.config.paths.state_file)?;
        Ok(StatusReport {
            tracked: state.len(),
            last_processed: state.last_processed(),
            since_last_run: resolve_range(Scope::SinceLastRun, today, state.last_processed_date()),
        })
    }

    /// Dated notes under the daily notes root whose date is in range.
    fn candidates(&self, range: &DateRange) -> EngineResult<Vec<PathBuf>> {
        let root = &self.config.paths.daily_notes;
        if !root.is_dir() {
            return Err(EngineError::config(format!(
                "daily notes directory {} does not exist",
                root.display()
            )));
        }

        let mut notes = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !self.config.is_note(path) {
                continue;
            }
            match date_from_filename(path) {
                Some(date) if range.contains(date) => notes.push(entry.into_path()),
                Some(_) => trace!(path = %path.display(), "Outside range"),
                None => trace!(path = %path.display(), "No date in file name"),
            }
        }
        debug!(root = %root.display(), count = notes.len(), "Collected candidate notes");
        Ok(notes)
    }

    /// Runs every step for one note. `Ok(false)` means a step failed.
    fn process_note(
        &self,
        writer: &mut ArtifactWriter,
        index: &HubIndex,
        note: &NoteFile,
        key: &str,
        summary: &mut RunSummary,
    ) -> EngineResult<bool> {
        let steps: [(&str, &dyn Fn(&mut ArtifactWriter, &mut RunSummary) -> EngineResult<()>); 3] = [
            ("meetings", &|writer, summary| self.sync_meetings(writer, index, note, summary)),
            ("contacts", &|writer, summary| self.sync_contacts(writer, note, summary)),
            ("tasks", &|writer, summary| self.sync_tasks(writer, note, summary)),
        ];

        let mut ok = true;
        for (stage, step) in steps {
            if let Err(e) = step(writer, summary) {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!(stage, error = %e, "Step failed");
                summary.fail(key, stage, e.to_string());
                ok = false;
            }
        }
        Ok(ok)
    }

    fn sync_meetings(
        &self,
        writer: &mut ArtifactWriter,
        index: &HubIndex,
        note: &NoteFile,
        summary: &mut RunSummary,
    ) -> EngineResult<()> {
        let config = &self.config;
        for (idx, block) in extract_meetings(&note.text).iter().enumerate() {
            let projected = MeetingNote::project(block, idx + 1, note, index);
            let (_, outcome) = write_meeting(
                writer,
                &config.paths.meeting_notes,
                &config.note_extension,
                &projected,
            )?;
            summary.meetings.record(outcome);
            summary.attendees_linked += projected.linked;
        }
        Ok(())
    }

    fn sync_contacts(
        &self,
        writer: &mut ArtifactWriter,
        note: &NoteFile,
        summary: &mut RunSummary,
    ) -> EngineResult<()> {
        let extraction = extract_contacts(&note.text);
        debug!(mode = ?extraction.mode, count = extraction.contacts.len(), "Extracted contacts");

        let hubs = HubWriter::new(&self.config);
        for contact in &extraction.contacts {
            // Company hub first so it exists when the person lands in its folder.
            if let Some(company) = contact.company.as_deref() {
                let details = (contact.kind == ContactKind::Company).then_some(contact);
                summary
                    .companies
                    .record(hubs.ensure_company(writer, company, details)?);
            }
            if contact.kind == ContactKind::Person {
                let result = hubs.save_person(writer, contact, note)?;
                summary.people.record(result.outcome());
            }
        }
        Ok(())
    }

    fn sync_tasks(
        &self,
        writer: &mut ArtifactWriter,
        note: &NoteFile,
        summary: &mut RunSummary,
    ) -> EngineResult<()> {
        let tasks = collect_tasks(note);
        let result = Backlog::new(&self.config.paths.task_list).append(writer, &tasks)?;
        summary.tasks.added += result.added;
        summary.tasks.duplicate += result.duplicate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::time::SystemTime;
    use tempfile::TempDir;

    const FRIDAY: &str = "\
# Friday

## Meeting with Acme Corp
Time: 10:00
Attendees: Jane Doe, Bob Roe

### Discussion
Pricing is fine.
- [ ] Send deck to Jane

## Contacts

Name: Jane Doe
Title: CTO
Email: jane@acme.com
Company: Acme Inc
";

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn noon(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap()
    }

    struct Vault {
        dir: TempDir,
    }

    impl Vault {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("Daily Notes")).unwrap();
            Self { dir }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn note(&self, name: &str, text: &str) {
            fs::write(self.root().join("Daily Notes").join(name), text).unwrap();
        }

        fn config(&self) -> SyncConfig {
            SyncConfig::for_vault(self.root())
        }

        fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.root().join(relative)).unwrap()
        }

        fn mtimes(&self) -> BTreeMap<PathBuf, SystemTime> {
            WalkDir::new(self.root())
                .into_iter()
                .map(|e| e.unwrap())
                .filter(|e| e.file_type().is_file())
                .map(|e| (e.path().to_path_buf(), e.metadata().unwrap().modified().unwrap()))
                .collect()
        }
    }

    #[test]
    fn first_run_materialises_everything() {
        let vault = Vault::new();
        vault.note("2025-03-14.md", FRIDAY);

        let summary = SyncEngine::new(vault.config()).run_at(day(14), noon(14)).unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.notes.seen, 1);
        assert_eq!(summary.notes.processed, 1);
        assert_eq!(summary.meetings.created, 1);
        assert_eq!(summary.people.created, 1);
        assert_eq!(summary.companies.created, 1);
        assert_eq!(summary.tasks.added, 1);

        assert!(vault.read("Meetings/2025-03-14 - Acme Corp.md").contains("- Jane Doe"));
        assert!(vault.read("People/Acme/Jane Doe (CTO).md").contains("jane@acme.com"));
        assert!(vault.read("Companies/Acme.md").contains("type: company"));
        assert!(vault.read("Tasks.md").contains(
            "- [ ] Send deck to Jane (from [[2025-03-14]], 2025-03-14)"
        ));
        assert!(vault.read(".notesync/state.json").contains("2025-03-14.md"));
        assert!(vault.read(".notesync/audit.md").contains("- notes: 1 seen, 1 processed"));
    }

    #[test]
    fn second_run_over_unchanged_notes_writes_nothing() {
        let vault = Vault::new();
        vault.note("2025-03-14.md", FRIDAY);
        let engine = SyncEngine::new(vault.config());
        engine.run_at(day(14), noon(14)).unwrap();
        let before = vault.mtimes();

        let summary = engine.run_at(day(14), noon(14) + chrono::Duration::hours(1)).unwrap();

        assert_eq!(summary.notes.skipped, 1);
        assert_eq!(summary.notes.processed, 0);
        assert_eq!(summary.meetings.total(), 0);
        assert_eq!(vault.mtimes(), before);
        assert_eq!(vault.read(".notesync/audit.md").matches("\n## ").count(), 1);
    }

    #[test]
    fn forced_rerun_counts_unchanged_artifacts() {
        let vault = Vault::new();
        vault.note("2025-03-14.md", FRIDAY);
        SyncEngine::new(vault.config()).run_at(day(14), noon(14)).unwrap();

        let forced = SyncEngine::new(vault.config().with_force(true));
        let summary = forced.run_at(day(14), noon(14)).unwrap();

        assert_eq!(summary.notes.processed, 1);
        assert_eq!(summary.people.unchanged, 1);
        assert_eq!(summary.companies.skipped, 1);
        assert_eq!(summary.tasks.duplicate, 1);
    }

    #[test]
    fn forced_reruns_keep_one_meeting_file() {
        let vault = Vault::new();
        vault.note("2025-03-14.md", FRIDAY);
        SyncEngine::new(vault.config()).run_at(day(14), noon(14)).unwrap();
        let meetings = || fs::read_dir(vault.root().join("Meetings")).unwrap().count();

        // Jane's hub exists now, so her attendee entry becomes a link.
        let forced = SyncEngine::new(vault.config().with_force(true));
        let summary = forced.run_at(day(14), noon(14)).unwrap();
        assert_eq!(summary.meetings.updated, 1);
        assert_eq!(summary.attendees_linked, 1);
        assert_eq!(meetings(), 1);
        assert!(vault
            .read("Meetings/2025-03-14 - Acme Corp.md")
            .contains("[[Jane Doe (CTO)|Jane Doe]]"));

        let before = vault.mtimes();
        let summary = forced.run_at(day(14), noon(14)).unwrap();
        assert_eq!(summary.meetings.unchanged, 1);
        assert_eq!(meetings(), 1);
        let meeting = vault.root().join("Meetings/2025-03-14 - Acme Corp.md");
        assert_eq!(vault.mtimes().get(&meeting), before.get(&meeting));
    }

    #[test]
    fn hubs_with_custom_extension_are_linked() {
        let vault = Vault::new();
        let hub = vault.root().join("People/Acme/Jane Doe (CTO).markdown");
        fs::create_dir_all(hub.parent().unwrap()).unwrap();
        fs::write(&hub, "---\ntype: person\n---\n").unwrap();

        let config = vault.config().with_note_extension("markdown");
        vault.note("2025-03-14.markdown", "## Meeting Kickoff\nAttendees: Jane Doe\n");
        let summary = SyncEngine::new(config).run_at(day(14), noon(14)).unwrap();

        assert_eq!(summary.notes.processed, 1);
        assert_eq!(summary.attendees_linked, 1);
        assert!(vault
            .read("Meetings/2025-03-14 - Kickoff.markdown")
            .contains("[[Jane Doe (CTO)|Jane Doe]] (CTO)"));
    }

    #[test]
    fn edited_note_is_reprocessed() {
        let vault = Vault::new();
        vault.note("2025-03-14.md", FRIDAY);
        let engine = SyncEngine::new(vault.config());
        engine.run_at(day(14), noon(14)).unwrap();

        vault.note("2025-03-14.md", &format!("{}\n- [ ] Call Bob\n", FRIDAY));
        let summary = engine.run_at(day(14), noon(14)).unwrap();

        assert_eq!(summary.notes.processed, 1);
        assert_eq!(summary.notes.skipped, 0);
        assert_eq!(summary.tasks.added, 1);
        assert_eq!(summary.tasks.duplicate, 1);
        assert_eq!(summary.people.unchanged, 1);
        assert_eq!(summary.meetings.created, 0);
        assert!(vault.read("Tasks.md").contains("- [ ] Call Bob"));
        assert_eq!(fs::read_dir(vault.root().join("Meetings")).unwrap().count(), 1);
    }

    #[test]
    fn new_email_is_merged_into_known_person() {
        let vault = Vault::new();
        vault.note("2025-03-14.md", FRIDAY);
        vault.note(
            "2025-03-15.md",
            "Name: Jane Doe\nTitle: CTO\nEmail: JANE.DOE@acme.com\nEmail: jane@acme.com\nCompany: Acme\n",
        );

        let engine = SyncEngine::new(vault.config().with_scope(Scope::ThisWeek));
        let summary = engine.run_at(day(14), noon(15)).unwrap();

        assert_eq!(summary.people.created, 1);
        assert_eq!(summary.people.updated, 1);
        let hub = vault.read("People/Acme/Jane Doe (CTO).md");
        assert_eq!(hub.matches("jane@acme.com").count(), 1);
        assert_eq!(hub.matches("jane.doe@acme.com").count(), 1);
    }

    #[test]
    fn dry_run_reports_without_touching_disk() {
        let vault = Vault::new();
        vault.note("2025-03-10.md", "## Meeting Kickoff\nAttendees: Jane Doe\n\nName: Jane Doe\nEmail: jane@acme.com\nCompany: Acme\n");
        vault.note("2025-03-11.md", "## Meeting Review\n\nName: Jane Doe\nEmail: jd@acme.com\nCompany: Acme\n");
        vault.note("2025-03-12.md", "## Meeting Retro\n- [ ] Book room\n");
        let state_path = vault.root().join(".notesync").join("state.json");
        fs::create_dir_all(state_path.parent().unwrap()).unwrap();
        fs::write(&state_path, "{\"notes\":{}}\n").unwrap();
        let before = vault.mtimes();

        let config = vault.config().with_scope(Scope::ThisWeek).with_dry_run(true);
        let summary = SyncEngine::new(config).run_at(day(12), noon(12)).unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.notes.processed, 3);
        assert_eq!(summary.meetings.created, 3);
        assert_eq!(summary.people.created, 1);
        assert_eq!(summary.people.updated, 1);
        assert_eq!(summary.companies.created, 1);
        assert_eq!(summary.companies.skipped, 1);
        assert_eq!(summary.tasks.added, 1);
        assert_eq!(vault.mtimes(), before);
        assert_eq!(fs::read_to_string(&state_path).unwrap(), "{\"notes\":{}}\n");
    }

    #[test]
    fn backlog_deduplicates_across_notes() {
        let vault = Vault::new();
        vault.note("2025-03-10.md", "- [ ] Send the deck\n");
        vault.note("2025-03-11.md", "- [ ] send the DECK\n");

        let engine = SyncEngine::new(vault.config().with_scope(Scope::ThisWeek));
        let summary = engine.run_at(day(12), noon(12)).unwrap();

        assert_eq!(summary.tasks.added, 1);
        assert_eq!(summary.tasks.duplicate, 1);
        assert_eq!(vault.read("Tasks.md").matches("- [ ]").count(), 1);
    }

    #[test]
    fn checked_backlog_items_are_swept() {
        let vault = Vault::new();
        fs::write(vault.root().join("Tasks.md"), "## Backlog\n\n- [x] Done thing\n- [ ] Open thing\n").unwrap();

        let summary = SyncEngine::new(vault.config()).run_at(day(14), noon(14)).unwrap();

        assert_eq!(summary.tasks.swept, 1);
        let tasks = vault.read("Tasks.md");
        assert!(tasks.contains("## Completed"));
        assert!(tasks.contains("- [x] Done thing"));
        assert!(vault.read(".notesync/audit.md").contains("1 swept"));
    }

    #[test]
    fn fatal_error_keeps_completed_notes() {
        let vault = Vault::new();
        vault.note("2025-03-10.md", "- [ ] First task\n");
        vault.note("2025-03-11.md", "## Meeting Blocked\nNotes.\n");
        let blocker = vault.root().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut config = vault.config().with_scope(Scope::ThisWeek);
        config.paths.meeting_notes = blocker.join("Meetings");
        let summary = SyncEngine::new(config).run_at(day(12), noon(12)).unwrap();

        assert!(summary.aborted.is_some());
        assert!(!summary.is_success());
        assert_eq!(summary.notes.processed, 1);
        let state = vault.read(".notesync/state.json");
        assert!(state.contains("2025-03-10.md"));
        assert!(!state.contains("2025-03-11.md"));
        assert!(vault.read(".notesync/audit.md").contains("- aborted: failed to write"));
    }

    #[test]
    fn files_outside_range_or_undated_are_ignored() {
        let vault = Vault::new();
        vault.note("2025-03-01.md", "- [ ] Old\n");
        vault.note("README.md", "- [ ] Not a daily note\n");
        vault.note("2025-03-14.txt", "- [ ] Wrong extension\n");

        let summary = SyncEngine::new(vault.config()).run_at(day(14), noon(14)).unwrap();

        assert_eq!(summary.notes.seen, 0);
        assert!(!vault.root().join("Tasks.md").exists());
        assert!(!vault.root().join(".notesync").exists());
    }

    #[test]
    fn missing_daily_notes_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = SyncEngine::new(SyncConfig::for_vault(dir.path()))
            .run_at(day(14), noon(14))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn status_reflects_state() {
        let vault = Vault::new();
        let engine = SyncEngine::new(vault.config());
        let empty = engine.status_at(day(14)).unwrap();
        assert_eq!(empty.tracked, 0);
        assert_eq!(empty.last_processed, None);
        assert_eq!(empty.since_last_run, DateRange::day(day(14), "since-last-run"));

        vault.note("2025-03-14.md", FRIDAY);
        engine.run_at(day(14), noon(14)).unwrap();
        let status = engine.status_at(day(14)).unwrap();
        assert_eq!(status.tracked, 1);
        assert_eq!(status.last_processed, Some(noon(14)));
        assert_eq!(status.since_last_run.end, day(14));
    }
}
