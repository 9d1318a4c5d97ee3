//! Attendee linking against the person hub tree.
//!
//! The index is rebuilt once per run by walking the hub root. Lookups are
//! case-insensitive on the name with any `(Title)` suffix removed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::error::EngineResult;
use crate::writer::ArtifactWriter;

/// `Name (Title)`, as used in hub file stems and attendee strings.
static PAREN_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*\(([^()]*)\)\s*$").expect("Invalid suffix regex"));

/// A person hub the linker can point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubRef {
    /// File stem, used as the link target.
    pub stem: String,
    /// Name without the title suffix.
    pub name: String,
    /// Title from the stem's parenthetical, if any.
    pub role: Option<String>,
    pub path: PathBuf,
}

/// Result of linking one attendee string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedAttendee {
    pub text: String,
    pub linked: bool,
}

/// Lowercased name → hub.
#[derive(Debug, Clone, Default)]
pub struct HubIndex {
    entries: HashMap<String, HubRef>,
}

impl HubIndex {
    /// Walks the person hub root once, indexing files with `extension`.
    pub fn build(writer: &ArtifactWriter, root: &Path, extension: &str) -> EngineResult<Self> {
        let files = writer.list_files(root, extension)?;
        let index = Self::from_paths(files);
        debug!(root = %root.display(), hubs = index.len(), "Built attendee index");
        Ok(index)
    }

    /// Builds the index from hub file paths. The first path wins for a name.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut entries = HashMap::new();
        for path in paths {
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            let (name, role) = split_title(&stem);
            let key = name.to_lowercase();
            if entries.contains_key(&key) {
                trace!(path = %path.display(), "Duplicate hub name, keeping first");
                continue;
            }
            entries.insert(
                key,
                HubRef {
                    stem: stem.clone(),
                    name: name.to_string(),
                    role: role.map(str::to_string),
                    path,
                },
            );
        }
        Self { entries }
    }

    /// Looks a name up, ignoring case and any `(Title)` suffix.
    pub fn lookup(&self, name: &str) -> Option<&HubRef> {
        let (name, _) = split_title(name.trim());
        self.entries.get(&name.to_lowercase())
    }

    /// Rewrites an attendee into a hub link, or leaves it as plain text.
    ///
    /// `Jane Doe - CTO - Acme` links as `[[Jane Doe (CTO)|Jane Doe]] (CTO)`;
    /// the explicit role wins over the one in the hub's file name.
    pub fn link(&self, attendee: &str) -> LinkedAttendee {
        let plain = LinkedAttendee {
            text: attendee.to_string(),
            linked: false,
        };
        if attendee.contains("[[") {
            return plain;
        }

        let mut parts = attendee.split(" - ").map(str::trim);
        let head = parts.next().unwrap_or_default();
        let explicit_role = parts.next().filter(|r| !r.is_empty());
        let (name, paren_role) = split_title(head);

        let Some(hub) = self.lookup(name) else {
            return plain;
        };
        let role = explicit_role.or(paren_role).or(hub.role.as_deref());
        let text = match role {
            Some(role) => format!("[[{}|{}]] ({})", hub.stem, hub.name, role),
            None => format!("[[{}|{}]]", hub.stem, hub.name),
        };
        LinkedAttendee { text, linked: true }
    }

    /// Returns the number of indexed names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no hub is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits `Name (Title)` into its parts.
pub fn split_title(text: &str) -> (&str, Option<&str>) {
    match PAREN_SUFFIX_REGEX.captures(text) {
        Some(caps) => {
            let name = caps.get(1).map_or(text, |m| m.as_str().trim());
            let role = caps.get(2).map(|m| m.as_str().trim()).filter(|r| !r.is_empty());
            if name.is_empty() { (text, None) } else { (name, role) }
        }
        None => (text.trim(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn index() -> HubIndex {
        HubIndex::from_paths([
            PathBuf::from("People/Acme/Jane Doe (CTO).md"),
            PathBuf::from("People/Triage/Bob Roe.md"),
        ])
    }

    #[test]
    fn split_titles() {
        assert_eq!(split_title("Jane Doe (CTO)"), ("Jane Doe", Some("CTO")));
        assert_eq!(split_title("Jane Doe"), ("Jane Doe", None));
        assert_eq!(split_title("Jane Doe ()"), ("Jane Doe", None));
        assert_eq!(split_title("(CTO)"), ("(CTO)", None));
    }

    #[test]
    fn lookup_is_case_insensitive_and_suffix_free() {
        let index = index();
        assert_eq!(index.lookup("jane doe").unwrap().stem, "Jane Doe (CTO)");
        assert_eq!(index.lookup("JANE DOE (VP)").unwrap().stem, "Jane Doe (CTO)");
        assert!(index.lookup("Carl").is_none());
    }

    #[test]
    fn link_infers_role_from_hub() {
        let linked = index().link("Jane Doe");
        assert!(linked.linked);
        assert_eq!(linked.text, "[[Jane Doe (CTO)|Jane Doe]] (CTO)");
    }

    #[test]
    fn link_prefers_explicit_role() {
        let linked = index().link("jane doe - Board Observer - Acme");
        assert_eq!(linked.text, "[[Jane Doe (CTO)|Jane Doe]] (Board Observer)");
    }

    #[test]
    fn link_without_any_role() {
        let linked = index().link("Bob Roe");
        assert_eq!(linked.text, "[[Bob Roe|Bob Roe]]");
    }

    #[test]
    fn miss_leaves_plain_text() {
        let linked = index().link("Carl Stone - PM");
        assert!(!linked.linked);
        assert_eq!(linked.text, "Carl Stone - PM");
    }

    #[test]
    fn existing_links_untouched() {
        let linked = index().link("[[Jane Doe (CTO)|Jane]]");
        assert!(!linked.linked);
    }

    #[test]
    fn build_walks_tree() {
        let dir = TempDir::new().unwrap();
        let acme = dir.path().join("Acme");
        fs::create_dir_all(&acme).unwrap();
        fs::write(acme.join("Jane Doe (CTO).md"), "").unwrap();
        fs::write(acme.join("ignore.txt"), "").unwrap();

        let index = HubIndex::build(&ArtifactWriter::new(false), dir.path(), "md").unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.lookup("Jane Doe").is_some());
    }

    #[test]
    fn build_on_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let index = HubIndex::build(&ArtifactWriter::new(false), &dir.path().join("People"), "md").unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn build_uses_configured_extension() {
        let dir = TempDir::new().unwrap();
        let acme = dir.path().join("Acme");
        fs::create_dir_all(&acme).unwrap();
        fs::write(acme.join("Jane Doe (CTO).markdown"), "").unwrap();
        fs::write(acme.join("Bob Roe.md"), "").unwrap();

        let index = HubIndex::build(&ArtifactWriter::new(false), dir.path(), "markdown").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.link("Jane Doe").text, "[[Jane Doe (CTO)|Jane Doe]] (CTO)");
        assert!(!index.link("Bob Roe").linked);
    }
}
