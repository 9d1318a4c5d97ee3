//! Meeting note projection and writing.
//!
//! Each extracted block becomes `<meetings>/<date> - <Subject>.md`. The
//! frontmatter records the source note and the block's position in it, which
//! together identify the block across runs. A file written for the same
//! block is updated in place; a file holding a different block is never
//! overwritten, and the next free `-N` suffix is used instead.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use notesync_core::text::sanitize_filename;
use notesync_core::{Document, Frontmatter, MeetingBlock, NoteFile, Outcome};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::linker::HubIndex;
use crate::writer::ArtifactWriter;

/// Upper bound on `-N` suffixes tried for one identity.
const MAX_SUFFIX: usize = 1000;

/// A meeting block rendered to its artifact form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingNote {
    pub date: NaiveDate,
    pub subject: String,
    pub content: String,
    /// `[[note]]` link to the daily note the block came from.
    pub source: String,
    /// 1-based position of the block within its note.
    pub block: usize,
    /// Attendees rewritten into hub links.
    pub linked: usize,
}

impl MeetingNote {
    /// Projects the `ordinal`-th block of `source`, linking attendees through `index`.
    pub fn project(block: &MeetingBlock, ordinal: usize, source: &NoteFile, index: &HubIndex) -> Self {
        let mut linked = 0;
        let attendees: Vec<String> = block
            .attendees
            .iter()
            .map(|attendee| {
                let result = index.link(attendee);
                if result.linked {
                    linked += 1;
                }
                result.text
            })
            .collect();

        let status = if block.tasks.is_empty() { "done" } else { "open" };
        let mut fm = Frontmatter::new()
            .with_str("type", "meeting")
            .with_str("title", block.subject.as_str())
            .with_str("date", source.date.to_string());
        if let Some(time) = &block.time {
            fm.set_str("time", time.as_str());
        }
        fm.set_list("attendees", attendees.clone());
        fm.set_str("status", status);
        fm.set_list("tags", vec!["meeting".to_string()]);
        let link = format!("[[{}]]", source.title());
        fm.set_str("source", link.as_str());
        fm.set_str("block", ordinal.to_string());
        if let Some(follow_up) = block.follow_up {
            fm.set_str("follow_up", follow_up.to_string());
        }

        let mut sections = vec![format!("# {}", block.subject)];
        if !attendees.is_empty() {
            sections.push(section("Attendees", &bullets(&attendees)));
        }
        if !block.discussion.is_empty() {
            sections.push(section("Discussion", &block.discussion.join("\n")));
        }
        for extra in &block.extra_sections {
            sections.push(section(&extra.heading, &extra.lines.join("\n")));
        }
        if !block.tasks.is_empty() {
            let tasks: Vec<String> = block.tasks.iter().map(|t| format!("- [ ] {}", t)).collect();
            sections.push(section("Action Items", &tasks.join("\n")));
        }
        if !block.urls.is_empty() {
            sections.push(section("Links", &bullets(&block.urls)));
        }
        let body = format!("\n{}\n", sections.join("\n\n"));

        Self {
            date: source.date,
            subject: block.subject.clone(),
            content: Document::new(fm, body).render(),
            source: link,
            block: ordinal,
            linked,
        }
    }
}

fn section(heading: &str, content: &str) -> String {
    if content.trim().is_empty() {
        format!("## {}", heading)
    } else {
        format!("## {}\n\n{}", heading, content)
    }
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Path for a meeting identity; `suffix` 0 is the bare name.
pub fn meeting_path(root: &Path, date: NaiveDate, subject: &str, suffix: usize, extension: &str) -> PathBuf {
    let mut subject = sanitize_filename(subject);
    if subject.is_empty() {
        subject = notesync_core::meeting::DEFAULT_SUBJECT.to_string();
    }
    let name = if suffix == 0 {
        format!("{} - {}.{}", date, subject, extension)
    } else {
        format!("{} - {}-{}.{}", date, subject, suffix, extension)
    };
    root.join(name)
}

/// Whether `existing` was written for the same block as `note`.
fn is_same_block(existing: &str, note: &MeetingNote) -> bool {
    let Ok(doc) = Document::parse(existing) else {
        return false;
    };
    let fm = &doc.frontmatter;
    fm.get_str("source") == Some(note.source.as_str())
        && fm.get_str("block").and_then(|b| b.parse().ok()) == Some(note.block)
}

/// Writes a meeting note, disambiguating identity collisions with a suffix.
///
/// The bare and suffixed paths are tried in order. The first one holding
/// this block is rewritten (or left alone if identical); a gap means the
/// block has no file yet and it is created there.
pub fn write_meeting(
    writer: &mut ArtifactWriter,
    root: &Path,
    extension: &str,
    note: &MeetingNote,
) -> EngineResult<(PathBuf, Outcome)> {
    let mut target = None;
    for suffix in 0..MAX_SUFFIX {
        let path = meeting_path(root, note.date, &note.subject, suffix, extension);
        match writer.read(&path)? {
            Some(existing) if existing == note.content => {
                return Ok((path, Outcome::Unchanged));
            }
            Some(existing) if is_same_block(&existing, note) => {
                target = Some(path);
                break;
            }
            Some(_) => {}
            None => {
                target = Some(path);
                break;
            }
        }
    }

    let Some(path) = target else {
        return Err(EngineError::note(
            meeting_path(root, note.date, &note.subject, 0, extension),
            "too many meeting notes with the same date and subject",
        ));
    };
    let outcome = writer.write(&path, &note.content)?;
    debug!(path = %path.display(), ?outcome, "Meeting note");
    Ok((path, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notesync_core::extract_meetings;
    use std::fs;
    use tempfile::TempDir;

    const NOTE: &str = "\
# Friday

## Meeting with Acme Corp
Time: 10:00
Attendees: Jane Doe, bob.roe@acme.com

### Discussion
Pricing is fine.
- [ ] Send deck to Jane
See https://acme.com/deck
Follow-up: 2025-03-20

## Journal
Quiet afternoon.
";

    fn source() -> NoteFile {
        NoteFile::new("Daily Notes/2025-03-14.md", NOTE).unwrap()
    }

    fn jane_index() -> HubIndex {
        HubIndex::from_paths([PathBuf::from("People/Acme/Jane Doe (CTO).md")])
    }

    #[test]
    fn projection_renders_frontmatter_and_sections() {
        let block = &extract_meetings(NOTE)[0];
        let note = MeetingNote::project(block, 1, &source(), &jane_index());

        assert_eq!(note.linked, 1);
        assert_eq!(
            note.content,
            "\
---
type: meeting
title: Acme Corp
date: 2025-03-14
time: 10:00
attendees:
  - \"[[Jane Doe (CTO)|Jane Doe]] (CTO)\"
  - Bob Roe
status: open
tags:
  - meeting
source: \"[[2025-03-14]]\"
block: \"1\"
follow_up: 2025-03-20
---

# Acme Corp

## Attendees

- [[Jane Doe (CTO)|Jane Doe]] (CTO)
- Bob Roe

## Discussion

Pricing is fine.
See https://acme.com/deck
Follow-up: 2025-03-20

## Action Items

- [ ] Send deck to Jane

## Links

- https://acme.com/deck
"
        );
    }

    #[test]
    fn status_done_without_tasks() {
        let block = MeetingBlock {
            subject: "Retro".to_string(),
            ..Default::default()
        };
        let note = MeetingNote::project(&block, 1, &source(), &HubIndex::default());
        let doc = Document::parse(&note.content).unwrap();
        assert_eq!(doc.frontmatter.get_str("status"), Some("done"));
        assert!(doc.frontmatter.get("time").is_none());
    }

    #[test]
    fn paths_and_suffixes() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let root = Path::new("/v/Meetings");
        assert_eq!(
            meeting_path(root, date, "Acme: Q3", 0, "md"),
            PathBuf::from("/v/Meetings/2025-03-14 - Acme Q3.md")
        );
        assert_eq!(
            meeting_path(root, date, "Acme: Q3", 2, "md"),
            PathBuf::from("/v/Meetings/2025-03-14 - Acme Q3-2.md")
        );
        assert_eq!(
            meeting_path(root, date, "///", 0, "md"),
            PathBuf::from("/v/Meetings/2025-03-14 - Meeting.md")
        );
    }

    #[test]
    fn same_identity_different_content_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let text = "## Meeting Foo\nfirst\n\n## Meeting Foo\nsecond\n";
        let note = NoteFile::new(dir.path().join("2025-03-14.md"), text).unwrap();
        let mut writer = ArtifactWriter::new(false);

        let mut paths = Vec::new();
        for (idx, block) in extract_meetings(text).iter().enumerate() {
            let projected = MeetingNote::project(block, idx + 1, &note, &HubIndex::default());
            let (path, outcome) = write_meeting(&mut writer, dir.path(), "md", &projected).unwrap();
            assert_eq!(outcome, Outcome::Created);
            paths.push(path);
        }

        assert_eq!(
            paths,
            vec![
                dir.path().join("2025-03-14 - Foo.md"),
                dir.path().join("2025-03-14 - Foo-1.md"),
            ]
        );
        assert!(fs::read_to_string(&paths[0]).unwrap().contains("first"));
        assert!(fs::read_to_string(&paths[1]).unwrap().contains("second"));
    }

    #[test]
    fn rewriting_identical_content_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let text = "## Meeting Foo\nfirst\n\n## Meeting Foo\nsecond\n";
        let note = NoteFile::new(dir.path().join("2025-03-14.md"), text).unwrap();
        let mut writer = ArtifactWriter::new(false);
        let projected: Vec<_> = extract_meetings(text)
            .iter()
            .enumerate()
            .map(|(idx, b)| MeetingNote::project(b, idx + 1, &note, &HubIndex::default()))
            .collect();

        for p in &projected {
            write_meeting(&mut writer, dir.path(), "md", p).unwrap();
        }
        for p in &projected {
            let (_, outcome) = write_meeting(&mut writer, dir.path(), "md", p).unwrap();
            assert_eq!(outcome, Outcome::Unchanged);
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn reprojected_block_updates_its_own_file() {
        let dir = TempDir::new().unwrap();
        let text = "## Meeting Foo\nAttendees: Jane Doe\n\n## Meeting Foo\nsecond\n";
        let note = NoteFile::new(dir.path().join("2025-03-14.md"), text).unwrap();
        let blocks = extract_meetings(text);
        let mut writer = ArtifactWriter::new(false);

        for (idx, block) in blocks.iter().enumerate() {
            let projected = MeetingNote::project(block, idx + 1, &note, &HubIndex::default());
            write_meeting(&mut writer, dir.path(), "md", &projected).unwrap();
        }

        // Jane's hub now exists, so the first block renders differently.
        let linked = MeetingNote::project(&blocks[0], 1, &note, &jane_index());
        assert_eq!(linked.linked, 1);
        let (path, outcome) = write_meeting(&mut writer, dir.path(), "md", &linked).unwrap();
        assert_eq!(outcome, Outcome::Updated);
        assert_eq!(path, dir.path().join("2025-03-14 - Foo.md"));
        assert!(fs::read_to_string(&path).unwrap().contains("[[Jane Doe (CTO)|Jane Doe]]"));

        let second = MeetingNote::project(&blocks[1], 2, &note, &jane_index());
        let (path, outcome) = write_meeting(&mut writer, dir.path(), "md", &second).unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
        assert_eq!(path, dir.path().join("2025-03-14 - Foo-1.md"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn file_from_another_note_is_not_claimed() {
        let dir = TempDir::new().unwrap();
        let mut writer = ArtifactWriter::new(false);
        let index = HubIndex::default();

        let daily = NoteFile::new(dir.path().join("2025-03-14.md"), "## Meeting Foo\nfirst\n").unwrap();
        let standup = NoteFile::new(dir.path().join("2025-03-14 standup.md"), "## Meeting Foo\nother\n").unwrap();
        let from_daily = MeetingNote::project(&extract_meetings(&daily.text)[0], 1, &daily, &index);
        let from_standup = MeetingNote::project(&extract_meetings(&standup.text)[0], 1, &standup, &index);

        write_meeting(&mut writer, dir.path(), "md", &from_daily).unwrap();
        let (path, outcome) = write_meeting(&mut writer, dir.path(), "md", &from_standup).unwrap();

        assert_eq!(outcome, Outcome::Created);
        assert_eq!(path, dir.path().join("2025-03-14 - Foo-1.md"));
    }
}
