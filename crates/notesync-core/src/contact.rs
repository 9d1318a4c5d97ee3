//! Contact and company extraction.
//!
//! Two strategies, tried in order:
//!
//! - **Strict**: keyed lines (`Name: ...`, `Email: ...`) grouped into records
//!   separated by blank lines or opener lines such as `Contact:`.
//! - **Flexible**: only when strict finds nothing. Each email address is an
//!   anchor; the lines around it are searched for a phone number, URLs, a job
//!   title, a capitalised name and a company. Results are merged per email.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::links::{UrlKind, classify_url, find_url};
use crate::text::{collapse_whitespace, heading, name_from_email, strip_bullet, strip_markdown};

/// Lines either side of an email anchor searched in flexible mode.
pub const FLEXIBLE_WINDOW: usize = 3;

/// `Key: value` lines recognised by strict mode.
static KEYED_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:[-*+]\s+)?\**(name|title|e-?mail|mobile|office|company|address|organi[sz]ation|org|website|linkedin|twitter)\**(?:\s*:\s*|\s+[-–]\s+)\**\s*(.*)$",
    )
    .expect("Invalid keyed line regex")
});

/// Lines that open a new contact record (`Contact:`, `## New contact`).
static OPENER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\**(?:new\s+)?(?:contact|person|company)(?:\s+(?:card|info|details))?\**\s*:?\**$")
        .expect("Invalid opener regex")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}")
        .expect("Invalid email regex")
});

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d[\d\s().\-]{5,}\d").expect("Invalid phone regex"));

static OFFICE_HINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:office|work|tel|direct|desk|landline)\b|\bo:").expect("Invalid office hint regex")
});

static TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:ceo|cto|cfo|coo|cmo|cio|ciso|vp|svp|evp|vice president|president|director|manager|head of|chief|officer|founder|co-founder|partner|engineer|lead|principal|analyst|consultant|architect|designer|coordinator|specialist|administrator|counsel|associate|recruiter|scientist|professor)\b",
    )
    .expect("Invalid title regex")
});

static NAME_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][A-Za-z'’\-]+(?:\s+[A-Z][A-Za-z'’\-.]*){1,3}$").expect("Invalid name line regex")
});

static NAME_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z'’\-]+(?:\s+[A-Z][a-z'’\-]+){1,2}\b").expect("Invalid name run regex")
});

static COMPANY_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b[A-Z][\w&'\-]*(?:\s+[A-Z&][\w&'\-]*)*,?\s+(?:Inc|LLC|Ltd|Limited|Corp|Corporation|Company|Co|GmbH|AG|PLC|LLP|Group|Holdings|Partners|Technologies|Labs|Systems|Solutions)\b\.?",
    )
    .expect("Invalid company suffix regex")
});

static ORG_UNIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:Department|Dept\.?|Division|School|College|University|Institute|Center|Centre|Bureau|Agency|Ministry|Office)\s+of\s+(?:the\s+)?[A-Z][\w&'\-]*(?:\s+[A-Z][\w&'\-]*)*",
    )
    .expect("Invalid organisation unit regex")
});

/// Legal suffixes removed when canonicalising company names.
static LEGAL_SUFFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[,\s]+(?:inc|incorporated|llc|l\.l\.c|ltd|limited|corp|corporation|co|company|gmbh|ag|s\.?a|plc|llp|pty(?:\s+ltd)?|bv|nv|srl|sarl)\.?\s*$",
    )
    .expect("Invalid legal suffix regex")
});

/// Kind of directory entry a contact produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    #[default]
    Person,
    Company,
}

/// Which extraction strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// No contacts found.
    None,
    Strict,
    Flexible,
}

/// A person or company found in a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedContact {
    pub kind: ContactKind,
    /// Person name, or the canonical company name for company contacts.
    pub name: String,
    pub title: Option<String>,
    /// Lowercased, without duplicates.
    pub emails: Vec<String>,
    pub mobile: Option<String>,
    pub office: Option<String>,
    /// Canonical company name.
    pub company: Option<String>,
    /// Department or other organisational unit.
    pub organization: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    /// Normalised phone numbers, without duplicates.
    pub phones: Vec<String>,
}

impl ParsedContact {
    /// Adds an email (case-folded) if not present.
    pub fn add_email(&mut self, email: &str) {
        let email = email.trim().trim_end_matches('.').to_lowercase();
        if !email.is_empty() && !self.emails.contains(&email) {
            self.emails.push(email);
        }
    }

    /// Adds a phone in normalised form if not present.
    pub fn add_phone(&mut self, phone: &str) {
        if let Some(normalized) = normalize_phone(phone) {
            if !self.phones.contains(&normalized) {
                self.phones.push(normalized);
            }
        }
    }

    /// Sets a URL into the field matching its host.
    pub fn add_url(&mut self, url: &str) {
        let slot = match classify_url(url) {
            UrlKind::Website => &mut self.website,
            UrlKind::LinkedIn => &mut self.linkedin,
            UrlKind::Twitter => &mut self.twitter,
        };
        fill(slot, url);
    }

    /// Merges another contact: scalars fill only if empty, lists are unioned.
    pub fn merge(&mut self, other: &ParsedContact) {
        if self.name.trim().is_empty() {
            self.name = other.name.clone();
        }
        for (slot, value) in [
            (&mut self.title, &other.title),
            (&mut self.mobile, &other.mobile),
            (&mut self.office, &other.office),
            (&mut self.company, &other.company),
            (&mut self.organization, &other.organization),
            (&mut self.address, &other.address),
            (&mut self.website, &other.website),
            (&mut self.linkedin, &other.linkedin),
            (&mut self.twitter, &other.twitter),
        ] {
            if let Some(value) = value {
                fill(slot, value);
            }
        }
        for email in &other.emails {
            self.add_email(email);
        }
        for phone in &other.phones {
            if !self.phones.contains(phone) {
                self.phones.push(phone.clone());
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.emails.is_empty() && self.company.is_none()
    }

    /// Resolves kind and fallback name once a record is complete.
    fn finish(mut self) -> Option<Self> {
        if self.is_empty() {
            return None;
        }
        if self.name.trim().is_empty() {
            match (self.emails.first(), &self.company) {
                (Some(email), _) => self.name = name_from_email(email),
                (None, Some(company)) => {
                    self.kind = ContactKind::Company;
                    self.name = company.clone();
                }
                (None, None) => return None,
            }
        }
        for phone in [self.mobile.clone(), self.office.clone()].into_iter().flatten() {
            self.add_phone(&phone);
        }
        Some(self)
    }
}

/// Result of running the extractor over a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactExtraction {
    pub mode: ExtractionMode,
    pub contacts: Vec<ParsedContact>,
}

/// Extracts contacts: strict first, flexible only if strict finds nothing.
pub fn extract_contacts(text: &str) -> ContactExtraction {
    let strict = extract_strict(text);
    if !strict.is_empty() {
        return ContactExtraction {
            mode: ExtractionMode::Strict,
            contacts: strict,
        };
    }
    let flexible = extract_flexible(text);
    let mode = if flexible.is_empty() {
        ExtractionMode::None
    } else {
        ExtractionMode::Flexible
    };
    ContactExtraction {
        mode,
        contacts: flexible,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Name,
    Title,
    Email,
    Mobile,
    Office,
    Company,
    Address,
    Organization,
    Website,
    LinkedIn,
    Twitter,
}

impl Key {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "title" => Some(Self::Title),
            "email" | "e-mail" => Some(Self::Email),
            "mobile" => Some(Self::Mobile),
            "office" => Some(Self::Office),
            "company" => Some(Self::Company),
            "address" => Some(Self::Address),
            "organization" | "organisation" | "org" => Some(Self::Organization),
            "website" => Some(Self::Website),
            "linkedin" => Some(Self::LinkedIn),
            "twitter" => Some(Self::Twitter),
            _ => None,
        }
    }
}

fn keyed_line(line: &str) -> Option<(Key, String)> {
    let caps = KEYED_LINE_REGEX.captures(line)?;
    let key = Key::parse(&caps[1])?;
    Some((key, strip_markdown(&caps[2])))
}

fn is_opener(line: &str) -> bool {
    let text = heading(line).map(|(_, text)| text).unwrap_or(line);
    OPENER_REGEX.is_match(text.trim())
}

/// Keyed-line scanner.
pub fn extract_strict(text: &str) -> Vec<ParsedContact> {
    let mut contacts: Vec<ParsedContact> = Vec::new();
    let mut current = ParsedContact::default();
    let mut in_address = false;

    fn flush(current: &mut ParsedContact, contacts: &mut Vec<ParsedContact>) {
        if let Some(contact) = std::mem::take(current).finish() {
            contacts.push(contact);
        }
    }

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_opener(trimmed) {
            flush(&mut current, &mut contacts);
            in_address = false;
            continue;
        }

        if let Some((key, value)) = keyed_line(trimmed) {
            if key == Key::Name && !current.name.is_empty() {
                flush(&mut current, &mut contacts);
            }
            in_address = key == Key::Address;
            apply_key(&mut current, key, &value);
            continue;
        }

        if in_address {
            let extra = strip_markdown(strip_bullet(trimmed));
            current.address = Some(match current.address.take() {
                Some(address) if !address.is_empty() => format!("{}, {}", address, extra),
                _ => extra,
            });
        }
    }
    flush(&mut current, &mut contacts);
    contacts
}

fn apply_key(contact: &mut ParsedContact, key: Key, value: &str) {
    let value = value.trim();
    if value.is_empty() && key != Key::Address {
        return;
    }
    match key {
        Key::Name => contact.name = collapse_whitespace(value),
        Key::Title => fill(&mut contact.title, value),
        Key::Email => {
            for m in EMAIL_REGEX.find_iter(value) {
                contact.add_email(m.as_str());
            }
        }
        Key::Mobile => fill(&mut contact.mobile, value),
        Key::Office => {
            if is_phone_shaped(value) {
                fill(&mut contact.office, value);
            } else {
                fill(&mut contact.organization, value);
            }
        }
        Key::Company => {
            let canonical = canonicalize_company(value);
            if !canonical.is_empty() {
                fill(&mut contact.company, &canonical);
            }
        }
        Key::Address => fill(&mut contact.address, value),
        Key::Organization => fill(&mut contact.organization, value),
        Key::Website | Key::LinkedIn | Key::Twitter => {
            let url = find_url(value).unwrap_or_else(|| value.to_string());
            match key {
                Key::Website => fill(&mut contact.website, &url),
                Key::LinkedIn => fill(&mut contact.linkedin, &url),
                _ => fill(&mut contact.twitter, &url),
            }
        }
    }
}

/// Email-anchored heuristic scanner.
pub fn extract_flexible(text: &str) -> Vec<ParsedContact> {
    let lines: Vec<&str> = text.lines().collect();
    let mut merged: Vec<ParsedContact> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        for m in EMAIL_REGEX.find_iter(line) {
            let email = m.as_str().trim_end_matches('.').to_lowercase();
            let start = idx.saturating_sub(FLEXIBLE_WINDOW);
            let end = (idx + FLEXIBLE_WINDOW + 1).min(lines.len());
            let candidate = scan_window(&lines[start..end], idx - start, &email, &line[..m.start()]);

            match merged.iter_mut().find(|c| c.emails.contains(&email)) {
                Some(existing) => existing.merge(&candidate),
                None => merged.push(candidate),
            }
        }
    }

    merged.into_iter().filter_map(ParsedContact::finish).collect()
}

fn scan_window(window: &[&str], anchor: usize, email: &str, before_email: &str) -> ParsedContact {
    let mut contact = ParsedContact::default();
    contact.add_email(email);

    // Nearest lines first so the closest match wins.
    let mut order: Vec<usize> = (0..window.len()).collect();
    order.sort_by_key(|&i| (i as isize - anchor as isize).unsigned_abs());

    for &i in &order {
        let raw = window[i];
        if raw.trim().is_empty() {
            continue;
        }
        let plain = strip_markdown(strip_bullet(raw.trim()));
        let without_email = EMAIL_REGEX.replace_all(&plain, "").into_owned();

        if let Some(m) = PHONE_REGEX.find(&without_email) {
            let phone = m.as_str().trim();
            if is_phone_shaped(phone) {
                if OFFICE_HINT_REGEX.is_match(&without_email) {
                    fill(&mut contact.office, phone);
                } else {
                    fill(&mut contact.mobile, phone);
                }
            }
        }

        if let Some(url) = find_url(&without_email) {
            contact.add_url(&url);
        }

        if contact.organization.is_none() {
            if let Some(m) = ORG_UNIT_REGEX.find(&without_email) {
                contact.organization = Some(collapse_whitespace(m.as_str()));
            }
        }

        if contact.company.is_none() {
            if let Some(m) = COMPANY_SUFFIX_REGEX.find(&without_email) {
                let canonical = canonicalize_company(m.as_str());
                if !canonical.is_empty() {
                    contact.company = Some(canonical);
                }
            }
        }

        if contact.title.is_none() {
            if let Some(title) = title_candidate(&without_email) {
                contact.title = Some(title);
            }
        }

        if contact.name.is_empty() && NAME_LINE_REGEX.is_match(without_email.trim()) {
            let candidate = without_email.trim();
            if !looks_like_non_name(candidate) {
                contact.name = collapse_whitespace(candidate);
            }
        }
    }

    if contact.name.is_empty() {
        let before = strip_markdown(before_email);
        if let Some(m) = NAME_RUN_REGEX.find_iter(&before).last() {
            if !looks_like_non_name(m.as_str()) {
                contact.name = m.as_str().to_string();
            }
        }
    }

    contact
}

fn title_candidate(line: &str) -> Option<String> {
    if line.contains("://") || line.len() > 120 {
        return None;
    }
    let segment = line
        .split(['|', ',', '·', ';'])
        .map(str::trim)
        .find(|segment| TITLE_REGEX.is_match(segment))?;
    let segment = segment
        .split(" at ")
        .next()
        .unwrap_or(segment)
        .trim_matches(|c: char| c == '-' || c == '–' || c.is_whitespace());
    if segment.is_empty() || segment.split_whitespace().count() > 8 {
        None
    } else {
        Some(segment.to_string())
    }
}

fn looks_like_non_name(candidate: &str) -> bool {
    TITLE_REGEX.is_match(candidate)
        || COMPANY_SUFFIX_REGEX.is_match(candidate)
        || ORG_UNIT_REGEX.is_match(candidate)
        || candidate.contains(':')
}

fn fill(slot: &mut Option<String>, value: &str) {
    let value = value.trim();
    if slot.as_deref().is_none_or(|s| s.trim().is_empty()) && !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

/// True if a value looks like a phone number rather than text.
pub fn is_phone_shaped(value: &str) -> bool {
    let value = value.trim();
    let value = value
        .split(|c: char| c.is_ascii_alphabetic())
        .next()
        .unwrap_or(value)
        .trim();
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return false;
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '.' | '(' | ')'))
}

/// Normalises a phone number to `+<digits>`; ten-digit numbers get `+1`.
pub fn normalize_phone(value: &str) -> Option<String> {
    if !is_phone_shaped(value) {
        return None;
    }
    let value = value.trim();
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    let normalized = if value.starts_with('+') {
        format!("+{}", digits)
    } else if digits.len() == 10 {
        format!("+1{}", digits)
    } else if digits.len() == 11 && digits.starts_with('1') {
        format!("+{}", digits)
    } else {
        digits
    };
    Some(normalized)
}

/// Canonical company name: markdown and legal suffixes stripped, whitespace collapsed.
pub fn canonicalize_company(name: &str) -> String {
    let mut name = collapse_whitespace(&strip_markdown(name));
    loop {
        let stripped = LEGAL_SUFFIX_REGEX.replace(&name, "").into_owned();
        if stripped == name || stripped.trim().is_empty() {
            break;
        }
        name = stripped;
    }
    collapse_whitespace(name.trim_end_matches([',', '.', ' ']))
}
