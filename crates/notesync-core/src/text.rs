//! Markdown text helpers shared by the extractors and writers.

use std::sync::LazyLock;

use regex::Regex;

/// Regex for ATX headings: `## Title`.
static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").expect("Invalid heading regex"));

/// Regex for markdown checklist items: `- [ ] text`, `* [x] text`.
static CHECKBOX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*+]\s+\[([ xX])\]\s+(.*\S)\s*$").expect("Invalid checkbox regex")
});

/// Regex for inline links `[text](url)`.
static INLINE_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("Invalid inline link regex"));

/// Regex for wikilinks `[[target|alias]]` / `[[target]]`.
static WIKILINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").expect("Invalid wikilink regex")
});

/// Regex for leading bullet / numbered-list markers.
static BULLET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])\s+").expect("Invalid bullet regex"));

/// Characters that are not allowed in file names on common platforms.
const FORBIDDEN_FILENAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '#', '^', '[', ']'];

/// Parses an ATX heading, returning its level and text.
pub fn heading(line: &str) -> Option<(usize, &str)> {
    let caps = HEADING_REGEX.captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let text = caps.get(2)?.as_str();
    Some((level, text))
}

/// A markdown checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkbox<'a> {
    /// Whether the item is ticked.
    pub checked: bool,
    /// The item text after the checkbox.
    pub text: &'a str,
}

/// Parses a checklist line.
pub fn checkbox(line: &str) -> Option<Checkbox<'_>> {
    let caps = CHECKBOX_REGEX.captures(line)?;
    let checked = !caps.get(1)?.as_str().trim().is_empty();
    let text = caps.get(2)?.as_str();
    Some(Checkbox { checked, text })
}

/// Removes a leading bullet or list number.
pub fn strip_bullet(line: &str) -> &str {
    match BULLET_REGEX.find(line) {
        Some(m) => &line[m.end()..],
        None => line.trim_start(),
    }
}

/// Strips inline markdown decoration, leaving plain text.
///
/// Links keep their label, wikilinks keep their alias (or target), emphasis
/// markers and code ticks are dropped, whitespace is collapsed.
pub fn strip_markdown(text: &str) -> String {
    let text = WIKILINK_REGEX.replace_all(text, |caps: &regex::Captures<'_>| {
        caps.get(2)
            .or_else(|| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    });
    let text = INLINE_LINK_REGEX.replace_all(&text, |caps: &regex::Captures<'_>| {
        let label = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if label.trim().is_empty() {
            caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default()
        } else {
            label.to_string()
        }
    });
    let text: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '`' | '~'))
        .collect();
    let text = text.replace("__", "");
    let text = text.trim_start_matches('>');
    collapse_whitespace(text)
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalises the first character of a word.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Derives a display name from an email address (best-effort).
///
/// Example: "sarah.chen@acme.com" → "Sarah Chen"
pub fn name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    local
        .split(['.', '_', '-', '+'])
        .filter(|s| !s.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Makes a string safe to use as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if FORBIDDEN_FILENAME_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();
    let cleaned = collapse_whitespace(&cleaned);
    cleaned.trim_matches('.').trim().to_string()
}
