//! Meeting block extraction from daily notes.
//!
//! A meeting block opens with a heading whose text starts with `Meeting`
//! (`## Meeting with Acme`) and runs until the next heading of the same or a
//! higher level, or the end of the note. Extraction is two passes:
//!
//! 1. [`transition`] drives a small state machine over the lines and collects
//!    the raw block lines.
//! 2. [`MeetingBlock::from_lines`] partitions a block by its sub-headings into
//!    the known Time / Attendees / Discussion sections; any other sub-heading
//!    becomes an extra section.
//!
//! Unchecked tasks, URLs and the follow-up date are scanned across the whole
//! block regardless of section. Notes without meeting headings yield no
//! blocks.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::links::extract_urls;
use crate::text::{checkbox, collapse_whitespace, heading, name_from_email, strip_bullet, strip_markdown};

/// Heading text that opens a meeting block.
static MEETING_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^meeting\b(.*)$").expect("Invalid meeting heading regex"));

/// Lead-in phrases stripped from the front of a subject.
static LEAD_IN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:with|about|on|re)(?:\s*:\s*|\s+)").expect("Invalid lead-in regex")
});

/// `Follow-up: 2024-03-08` / `Due: 2024-03-08`.
static FOLLOW_UP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:follow[- ]?up|due)\s*:\s*(\d{4}-\d{2}-\d{2})")
        .expect("Invalid follow-up regex")
});

/// Inline `Time: 10:00` / `Attendees: a, b` lines before any sub-heading.
static INLINE_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*+]\s+)?\**(time|attendees)\**\s*:\**\s*(.+)$")
        .expect("Invalid inline field regex")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

/// Default subject when normalisation leaves nothing.
pub const DEFAULT_SUBJECT: &str = "Meeting";

/// Parser position while scanning a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Not inside a meeting block.
    Outside,
    /// Inside a block opened by a heading of `level`, before any sub-heading.
    InBlock { level: usize },
    /// Inside a sub-section of a block opened at `level`.
    InSection { level: usize },
}

impl ParseState {
    fn block_level(self) -> Option<usize> {
        match self {
            Self::Outside => None,
            Self::InBlock { level } | Self::InSection { level } => Some(level),
        }
    }
}

/// What a line means for the block being collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Line is outside any block.
    Ignore,
    /// A meeting heading opened a new block (closing any open one first).
    Open { subject: String },
    /// Line belongs to the open block.
    Line,
    /// Line is a sub-heading inside the open block.
    Section,
    /// A same-or-higher level heading closed the open block.
    Close,
}

/// Single transition function of the extractor state machine.
pub fn transition(state: ParseState, line: &str) -> (ParseState, LineEvent) {
    let Some((level, text)) = heading(line) else {
        return match state {
            ParseState::Outside => (state, LineEvent::Ignore),
            _ => (state, LineEvent::Line),
        };
    };

    match state.block_level() {
        Some(block_level) if level > block_level => {
            (ParseState::InSection { level: block_level }, LineEvent::Section)
        }
        _ => match meeting_subject(text) {
            Some(subject) => (ParseState::InBlock { level }, LineEvent::Open { subject }),
            None if state == ParseState::Outside => (state, LineEvent::Ignore),
            None => (ParseState::Outside, LineEvent::Close),
        },
    }
}

/// Returns the normalised subject if the heading text opens a meeting.
pub fn meeting_subject(heading_text: &str) -> Option<String> {
    let plain = strip_markdown(heading_text);
    let caps = MEETING_HEADING_REGEX.captures(&plain)?;
    Some(normalize_subject(caps.get(1).map(|m| m.as_str()).unwrap_or_default()))
}

/// Strips leading punctuation and lead-in phrases from a subject.
pub fn normalize_subject(raw: &str) -> String {
    let mut subject = collapse_whitespace(&strip_markdown(raw));
    loop {
        let trimmed = subject
            .trim_start_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || "–—•".contains(c))
            .to_string();
        let stripped = LEAD_IN_REGEX.replace(&trimmed, "").into_owned();
        if stripped == subject {
            break;
        }
        subject = stripped;
    }
    let subject = subject.trim().to_string();
    if subject.is_empty() {
        DEFAULT_SUBJECT.to_string()
    } else {
        subject
    }
}

/// A named sub-section the extractor does not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSection {
    pub heading: String,
    pub lines: Vec<String>,
}

/// Structured content of one meeting heading block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingBlock {
    pub subject: String,
    pub time: Option<String>,
    pub attendees: Vec<String>,
    pub discussion: Vec<String>,
    pub extra_sections: Vec<ExtraSection>,
    /// Unchecked task texts, in order.
    pub tasks: Vec<String>,
    pub urls: Vec<String>,
    pub follow_up: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    Preamble,
    Time,
    Attendees,
    Discussion,
    Extra(usize),
}

impl Section {
    fn from_heading(text: &str) -> Option<Self> {
        let key = strip_markdown(text).trim_end_matches(':').trim().to_lowercase();
        match key.as_str() {
            "time" => Some(Self::Time),
            "attendees" => Some(Self::Attendees),
            "discussion" => Some(Self::Discussion),
            _ => None,
        }
    }
}

impl MeetingBlock {
    /// Partitions the raw lines of one block (heading excluded).
    pub fn from_lines(subject: impl Into<String>, lines: &[&str]) -> Self {
        let mut block = Self {
            subject: subject.into(),
            ..Default::default()
        };
        let mut section = Section::Preamble;
        let mut in_fence = false;

        for line in lines {
            let is_fence_marker = line.trim_start().starts_with("```");
            let fenced = in_fence || is_fence_marker;
            if is_fence_marker {
                in_fence = !in_fence;
            }

            if let Some((_, text)) = heading(line).filter(|_| !fenced) {
                section = match Section::from_heading(text) {
                    Some(known) => known,
                    None => {
                        block.extra_sections.push(ExtraSection {
                            heading: strip_markdown(text),
                            lines: Vec::new(),
                        });
                        Section::Extra(block.extra_sections.len() - 1)
                    }
                };
                continue;
            }

            if let Some(task) = checkbox(line).filter(|t| !t.checked && !fenced) {
                block.tasks.push(task.text.to_string());
                continue;
            }

            match section {
                Section::Preamble => block.push_preamble(line),
                Section::Time => {
                    let value = strip_markdown(strip_bullet(line));
                    if block.time.is_none() && !value.is_empty() {
                        block.time = Some(value);
                    }
                }
                Section::Attendees => block.push_attendees(strip_bullet(line)),
                Section::Discussion => block.discussion.push(line.trim_end().to_string()),
                Section::Extra(idx) => block.extra_sections[idx].lines.push(line.trim_end().to_string()),
            }
        }

        let joined = lines.join("\n");
        block.urls = extract_urls(&joined);
        block.follow_up = FOLLOW_UP_REGEX
            .captures_iter(&joined)
            .find_map(|caps| NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok());

        trim_blank_edges(&mut block.discussion);
        for extra in &mut block.extra_sections {
            trim_blank_edges(&mut extra.lines);
        }
        block
    }

    fn push_preamble(&mut self, line: &str) {
        if let Some(caps) = INLINE_FIELD_REGEX.captures(line) {
            let value = caps[2].trim();
            if caps[1].eq_ignore_ascii_case("time") {
                if self.time.is_none() {
                    self.time = Some(strip_markdown(value));
                }
            } else {
                self.push_attendees(value);
            }
            return;
        }
        self.discussion.push(line.trim_end().to_string());
    }

    fn push_attendees(&mut self, line: &str) {
        for token in line.split([',', ';']) {
            if let Some(name) = normalize_attendee(token) {
                if !self.attendees.iter().any(|a| a.eq_ignore_ascii_case(&name)) {
                    self.attendees.push(name);
                }
            }
        }
    }
}

/// Cleans one attendee token; email-shaped tokens become display names.
pub fn normalize_attendee(token: &str) -> Option<String> {
    let cleaned = strip_markdown(strip_bullet(token.trim()));
    let cleaned = cleaned.trim_matches(|c: char| c == '<' || c == '>').trim();
    if cleaned.is_empty() {
        return None;
    }
    if EMAIL_REGEX.is_match(cleaned) {
        return Some(name_from_email(cleaned));
    }
    Some(cleaned.to_string())
}

fn trim_blank_edges(lines: &mut Vec<String>) {
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.trim().is_empty()).count();
    lines.drain(..leading);
}

/// Extracts every meeting block from a note.
pub fn extract_meetings(text: &str) -> Vec<MeetingBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    let mut state = ParseState::Outside;
    let mut in_fence = false;

    for line in text.lines() {
        let is_fence_marker = line.trim_start().starts_with("```");
        let fenced = in_fence || is_fence_marker;
        if is_fence_marker {
            in_fence = !in_fence;
        }
        if fenced {
            if let Some((_, lines)) = current.as_mut() {
                lines.push(line);
            }
            continue;
        }

        let (next, event) = transition(state, line);
        state = next;
        match event {
            LineEvent::Ignore => {}
            LineEvent::Open { subject } => {
                if let Some((subject, lines)) = current.take() {
                    blocks.push(MeetingBlock::from_lines(subject, &lines));
                }
                current = Some((subject, Vec::new()));
            }
            LineEvent::Line | LineEvent::Section => {
                if let Some((_, lines)) = current.as_mut() {
                    lines.push(line);
                }
            }
            LineEvent::Close => {
                if let Some((subject, lines)) = current.take() {
                    blocks.push(MeetingBlock::from_lines(subject, &lines));
                }
            }
        }
    }

    if let Some((subject, lines)) = current.take() {
        blocks.push(MeetingBlock::from_lines(subject, &lines));
    }
    blocks
}
