//! Person and company hub files.
//!
//! A person hub lives at `<person_hubs>/<Company or triage>/<Name> (<Title>).md`.
//! Re-encountering a person merges into the existing file without ever
//! overwriting what is there: list fields are unioned, empty scalars are
//! filled, and the body template is only re-added when its marker heading
//! is gone. Company hubs are created once and never touched again.

use std::fmt;
use std::path::PathBuf;

use notesync_core::text::sanitize_filename;
use notesync_core::{Document, FieldValue, Frontmatter, FrontmatterError, NoteFile, Outcome, ParsedContact};
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::error::EngineResult;
use crate::writer::ArtifactWriter;

/// Heading whose presence means the body template is in place.
pub const PERSON_BODY_MARKER: &str = "## Meetings";

/// Scalar frontmatter keys of a person hub, in file order.
const PERSON_SCALARS: &[&str] = &[
    "name",
    "title",
    "company",
    "organization",
    "mobile",
    "office",
    "address",
    "website",
    "linkedin",
    "twitter",
];

/// Why an existing hub was left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The frontmatter could not be parsed.
    Frontmatter(FrontmatterError),
    /// The file has no frontmatter block at all.
    NoFrontmatter,
    /// The contact has no name usable as a file name.
    NoName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frontmatter(e) => write!(f, "unreadable frontmatter: {}", e),
            Self::NoFrontmatter => f.write_str("no frontmatter"),
            Self::NoName => f.write_str("contact has no usable name"),
        }
    }
}

/// Result of saving a person hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubWrite {
    /// A new hub was written.
    Created(PathBuf),
    /// An existing hub was merged; the outcome is `Updated` or `Unchanged`.
    Merged(PathBuf, Outcome),
    /// The hub was left alone.
    Skipped(SkipReason),
}

impl HubWrite {
    /// Counter bucket for the run summary.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Created(_) => Outcome::Created,
            Self::Merged(_, outcome) => *outcome,
            Self::Skipped(_) => Outcome::Skipped,
        }
    }
}

/// Writes person and company hubs.
#[derive(Debug)]
pub struct HubWriter<'a> {
    config: &'a SyncConfig,
}

impl<'a> HubWriter<'a> {
    pub fn new(config: &'a SyncConfig) -> Self {
        Self { config }
    }

    /// Hub path for a person. Depends only on name, title and company.
    pub fn person_path(&self, contact: &ParsedContact) -> Option<PathBuf> {
        let name = sanitize_filename(&contact.name);
        if name.is_empty() {
            return None;
        }
        let folder = contact
            .company
            .as_deref()
            .map(sanitize_filename)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.config.triage_folder.clone());
        let title = contact
            .title
            .as_deref()
            .map(sanitize_filename)
            .filter(|t| !t.is_empty());
        let file = match title {
            Some(title) => format!("{} ({}).{}", name, title, self.config.note_extension),
            None => format!("{}.{}", name, self.config.note_extension),
        };
        Some(self.config.paths.person_hubs.join(folder).join(file))
    }

    /// Hub path for a company.
    pub fn company_path(&self, company: &str) -> Option<PathBuf> {
        let name = sanitize_filename(company);
        if name.is_empty() {
            return None;
        }
        Some(
            self.config
                .paths
                .company_hubs
                .join(format!("{}.{}", name, self.config.note_extension)),
        )
    }

    /// Creates the company hub if it does not exist yet.
    pub fn ensure_company(
        &self,
        writer: &mut ArtifactWriter,
        company: &str,
        details: Option<&ParsedContact>,
    ) -> EngineResult<Outcome> {
        let Some(path) = self.company_path(company) else {
            return Ok(Outcome::Skipped);
        };
        if writer.exists(&path) {
            return Ok(Outcome::Skipped);
        }
        let outcome = writer.create_new(&path, &company_template(company, details))?;
        debug!(path = %path.display(), ?outcome, "Company hub");
        Ok(outcome)
    }

    /// Creates or merges a person hub.
    pub fn save_person(
        &self,
        writer: &mut ArtifactWriter,
        contact: &ParsedContact,
        source: &NoteFile,
    ) -> EngineResult<HubWrite> {
        let Some(path) = self.person_path(contact) else {
            return Ok(HubWrite::Skipped(SkipReason::NoName));
        };

        let Some(existing) = writer.read(&path)? else {
            let content = person_template(contact, source).render();
            writer.write(&path, &content)?;
            debug!(path = %path.display(), "Created person hub");
            return Ok(HubWrite::Created(path));
        };

        match merge_person(&existing, contact, source) {
            Ok(merged) => {
                let outcome = writer.write(&path, &merged)?;
                debug!(path = %path.display(), ?outcome, "Merged person hub");
                Ok(HubWrite::Merged(path, outcome))
            }
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Leaving person hub untouched");
                Ok(HubWrite::Skipped(reason))
            }
        }
    }
}

fn source_link(source: &NoteFile) -> String {
    format!("[[{}]]", source.title())
}

fn person_scalar(contact: &ParsedContact, key: &str) -> Option<String> {
    let value = match key {
        "name" => Some(&contact.name),
        "title" => contact.title.as_ref(),
        "company" => contact.company.as_ref(),
        "organization" => contact.organization.as_ref(),
        "mobile" => contact.mobile.as_ref(),
        "office" => contact.office.as_ref(),
        "address" => contact.address.as_ref(),
        "website" => contact.website.as_ref(),
        "linkedin" => contact.linkedin.as_ref(),
        "twitter" => contact.twitter.as_ref(),
        _ => None,
    };
    value.filter(|v| !v.trim().is_empty()).cloned()
}

fn person_body(name: &str) -> String {
    format!(
        "\n# {name}\n\n{PERSON_BODY_MARKER}\n\n```query\n\"{name}\" path:Meetings\n```\n\n## Mentions\n\n```query\n\"{name}\" -path:Meetings\n```\n\n## Notes\n"
    )
}

/// Full document for a new person hub.
pub fn person_template(contact: &ParsedContact, source: &NoteFile) -> Document {
    let mut fm = Frontmatter::new().with_str("type", "person");
    for key in PERSON_SCALARS {
        fm.set_str(*key, person_scalar(contact, key).unwrap_or_default());
    }
    fm.set_list("emails", contact.emails.clone());
    fm.set_list("phones", contact.phones.clone());
    fm.set_list("tags", vec!["person".to_string()]);
    fm.set_str("first_seen", source.date.to_string());
    fm.set_list("sources", vec![source_link(source)]);
    Document::new(fm, person_body(&contact.name))
}

/// Merges a contact into an existing hub's text without dropping anything.
///
/// Keys the merge does not change keep their original lines, comments
/// included. A frontmatter block the codec cannot represent is left alone.
pub fn merge_person(existing: &str, contact: &ParsedContact, source: &NoteFile) -> Result<String, SkipReason> {
    let mut doc = Document::parse(existing).map_err(SkipReason::Frontmatter)?;
    if doc.frontmatter.is_empty() {
        return Err(SkipReason::NoFrontmatter);
    }
    let fm = &mut doc.frontmatter;

    for key in PERSON_SCALARS {
        let Some(value) = person_scalar(contact, key) else {
            continue;
        };
        let is_empty = match fm.get(key) {
            None => true,
            Some(FieldValue::Scalar(s)) => s.trim().is_empty(),
            Some(FieldValue::List(_)) => false,
        };
        if is_empty {
            fm.set_str(*key, value);
        }
    }

    union_list(fm, "emails", &contact.emails, true);
    union_list(fm, "phones", &contact.phones, false);
    union_list(fm, "sources", &[source_link(source)], false);

    if !doc.body.contains(PERSON_BODY_MARKER) {
        let name = doc
            .frontmatter
            .get_str("name")
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&contact.name)
            .to_string();
        if !doc.body.is_empty() && !doc.body.ends_with('\n') {
            doc.body.push('\n');
        }
        doc.body.push_str(&person_body(&name));
    }

    Ok(doc.render())
}

fn union_list(fm: &mut Frontmatter, key: &str, additions: &[String], case_insensitive: bool) {
    let mut items = fm.get_list(key);
    let before = items.len();
    for item in additions {
        let seen = items.iter().any(|existing| {
            if case_insensitive {
                existing.eq_ignore_ascii_case(item)
            } else {
                existing == item
            }
        });
        if !seen {
            items.push(item.clone());
        }
    }
    if items.len() != before || fm.get(key).is_none() {
        fm.set_list(key, items);
    }
}

/// Minimal document for a new company hub.
pub fn company_template(company: &str, details: Option<&ParsedContact>) -> String {
    let mut fm = Frontmatter::new()
        .with_str("type", "company")
        .with_str("name", company);
    if let Some(website) = details.and_then(|d| d.website.as_deref()) {
        fm.set_str("website", website);
    }
    if let Some(linkedin) = details.and_then(|d| d.linkedin.as_deref()) {
        fm.set_str("linkedin", linkedin);
    }
    fm.set_list("tags", vec!["company".to_string()]);
    let body = format!(
        "\n# {company}\n\n## People\n\n```query\npath:\"People/{company}\"\n```\n\n## Meetings\n\n```query\n\"{company}\" path:Meetings\n```\n"
    );
    Document::new(fm, body).render()
}
