//! The shared task backlog.
//!
//! Two idempotent operations on the master task list:
//!
//! - [`append`] adds unchecked tasks from a note under `## Backlog`, skipping
//!   any whose text is already in the document (case-insensitive).
//! - [`sweep`] moves checked items out of the backlog into `## Completed`,
//!   under a `### Swept <timestamp>` banner, keeping their order.
//!
//! Both are pure functions over the document text; [`Backlog`] wraps them
//! with a read and an atomic rewrite of the file.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate};
use notesync_core::text::{checkbox, collapse_whitespace, heading, strip_markdown};
use notesync_core::NoteFile;
use regex::Regex;
use tracing::debug;

use crate::error::EngineResult;
use crate::writer::ArtifactWriter;

pub const BACKLOG_HEADING: &str = "Backlog";
pub const COMPLETED_HEADING: &str = "Completed";

/// Trailing `(from [[note]], 2025-03-14)` annotation on backlog entries.
static SOURCE_ANNOTATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(from \[\[[^\]]*\]\](?:,\s*\d{4}-\d{2}-\d{2})?\)\s*$")
        .expect("Invalid source annotation regex")
});

/// An unchecked task found in a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    pub text: String,
    /// Stem of the note the task came from.
    pub source: String,
    pub date: NaiveDate,
}

impl TaskLine {
    /// Backlog entry: `- [ ] text (from [[note]], date)`.
    pub fn entry(&self) -> String {
        format!("- [ ] {} (from [[{}]], {})", self.text, self.source, self.date)
    }
}

/// Counters from one append.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendResult {
    pub added: usize,
    pub duplicate: usize,
}

/// Collects every unchecked task in a note, skipping fenced code.
pub fn collect_tasks(note: &NoteFile) -> Vec<TaskLine> {
    let source = note.title();
    let mut in_fence = false;
    let mut tasks = Vec::new();
    for line in note.text.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(task) = checkbox(line).filter(|t| !t.checked) {
            tasks.push(TaskLine {
                text: collapse_whitespace(task.text),
                source: source.clone(),
                date: note.date,
            });
        }
    }
    tasks
}

/// Comparison key for a task: annotation removed, plain text, lowercase.
pub fn normalize_task(text: &str) -> String {
    let without_source = SOURCE_ANNOTATION_REGEX.replace(text, "");
    strip_markdown(&without_source).to_lowercase()
}

/// Line span `[start, end)` of the section under a heading named `name`.
///
/// `start` is the heading line; the section ends at the next heading of the
/// same or a higher level.
fn section_span(lines: &[String], name: &str) -> Option<(usize, usize, usize)> {
    let (start, level) = lines.iter().enumerate().find_map(|(idx, line)| {
        heading(line)
            .filter(|(_, text)| text.trim().eq_ignore_ascii_case(name))
            .map(|(level, _)| (idx, level))
    })?;
    let end = lines[start + 1..]
        .iter()
        .position(|line| heading(line).is_some_and(|(l, _)| l <= level))
        .map_or(lines.len(), |offset| start + 1 + offset);
    Some((start, end, level))
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Index just past the last non-blank line of a section.
fn content_end(lines: &[String], start: usize, end: usize) -> usize {
    (start + 1..end)
        .rev()
        .find(|&idx| !lines[idx].trim().is_empty())
        .map_or(start + 1, |idx| idx + 1)
}

/// Appends unseen tasks under the Backlog heading, creating it if needed.
pub fn append(text: &str, tasks: &[TaskLine]) -> (String, AppendResult) {
    let mut lines = split_lines(text);
    let mut seen: HashSet<String> = lines
        .iter()
        .filter_map(|line| checkbox(line))
        .map(|task| normalize_task(task.text))
        .collect();

    let mut result = AppendResult::default();
    let mut entries = Vec::new();
    for task in tasks {
        if seen.insert(normalize_task(&task.text)) {
            entries.push(task.entry());
            result.added += 1;
        } else {
            result.duplicate += 1;
        }
    }
    if entries.is_empty() {
        return (text.to_string(), result);
    }

    match section_span(&lines, BACKLOG_HEADING) {
        Some((start, end, _)) => {
            let mut at = content_end(&lines, start, end);
            if at == start + 1 {
                lines.insert(at, String::new());
                at += 1;
            }
            for (offset, entry) in entries.into_iter().enumerate() {
                lines.insert(at + offset, entry);
            }
        }
        None => {
            if lines.is_empty() {
                lines.push("# Tasks".to_string());
            }
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.push(format!("## {}", BACKLOG_HEADING));
            lines.push(String::new());
            lines.extend(entries);
        }
    }
    (join_lines(&lines), result)
}

/// Moves checked backlog items under Completed with a timestamp banner.
pub fn sweep(text: &str, now: DateTime<Local>) -> (String, usize) {
    let mut lines = split_lines(text);
    let Some((start, end, _)) = section_span(&lines, BACKLOG_HEADING) else {
        return (text.to_string(), 0);
    };

    let done: Vec<usize> = (start + 1..end)
        .filter(|&idx| checkbox(&lines[idx]).is_some_and(|t| t.checked))
        .collect();
    if done.is_empty() {
        return (text.to_string(), 0);
    }
    let moved: Vec<String> = done.iter().map(|&idx| lines[idx].clone()).collect();
    for &idx in done.iter().rev() {
        lines.remove(idx);
    }

    let banner = format!("### Swept {}", now.format("%Y-%m-%d %H:%M"));
    let mut block = vec![String::new(), banner];
    block.extend(moved.iter().cloned());

    match section_span(&lines, COMPLETED_HEADING) {
        Some((start, _, _)) => {
            let at = start + 1;
            for (offset, line) in block.into_iter().enumerate() {
                lines.insert(at + offset, line);
            }
        }
        None => {
            while lines.last().is_some_and(|l| l.trim().is_empty()) {
                lines.pop();
            }
            lines.push(String::new());
            lines.push(format!("## {}", COMPLETED_HEADING));
            lines.extend(block);
        }
    }
    (join_lines(&lines), moved.len())
}

/// The master task list file.
#[derive(Debug)]
pub struct Backlog<'a> {
    path: &'a Path,
}

impl<'a> Backlog<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    /// Appends tasks from one note.
    pub fn append(&self, writer: &mut ArtifactWriter, tasks: &[TaskLine]) -> EngineResult<AppendResult> {
        if tasks.is_empty() {
            return Ok(AppendResult::default());
        }
        let text = writer.read(self.path)?.unwrap_or_default();
        let (updated, result) = append(&text, tasks);
        if result.added > 0 {
            writer.write(self.path, &updated)?;
        }
        debug!(path = %self.path.display(), added = result.added, duplicate = result.duplicate, "Backlog append");
        Ok(result)
    }

    /// Sweeps checked items once; returns how many moved.
    pub fn sweep(&self, writer: &mut ArtifactWriter, now: DateTime<Local>) -> EngineResult<usize> {
        let Some(text) = writer.read(self.path)? else {
            return Ok(0);
        };
        let (updated, swept) = sweep(&text, now);
        if swept > 0 {
            let outcome = writer.write(self.path, &updated)?;
            debug!(path = %self.path.display(), swept, ?outcome, "Backlog sweep");
        }
        Ok(swept)
    }
}
