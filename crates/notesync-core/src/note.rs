//! Daily note input documents.
//!
//! A [`NoteFile`] is re-read on every run. The only thing remembered between
//! runs is its content hash, see [`content_hash`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Matches an ISO date anywhere in a file name.
static FILENAME_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("Invalid filename date regex"));

/// A dated markdown note read from the daily notes directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    /// Location of the note on disk.
    pub path: PathBuf,
    /// Date embedded in the file name.
    pub date: NaiveDate,
    /// Raw markdown text.
    pub text: String,
    /// SHA-256 of the raw text, lowercase hex.
    pub hash: String,
}

impl NoteFile {
    /// Builds a note from its path and contents.
    ///
    /// Returns `None` when the file name does not embed an ISO date; such
    /// files are not eligible for processing.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let date = date_from_filename(&path)?;
        let text = text.into();
        let hash = content_hash(text.as_bytes());
        Some(Self {
            path,
            date,
            text,
            hash,
        })
    }

    /// Title used for back-links: the file stem.
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.date.to_string())
    }
}

/// Extracts the first valid ISO date from a path's file name.
pub fn date_from_filename(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_string_lossy();
    FILENAME_DATE_REGEX.captures_iter(&name).find_map(|caps| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Computes the content hash used for change detection.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(digest)
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_from_plain_filename() {
        let date = date_from_filename(Path::new("notes/2024-03-06.md"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 6));
    }

    #[test]
    fn date_from_decorated_filename() {
        let date = date_from_filename(Path::new("Journal 2024-12-31 (Tue).md"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn invalid_date_is_ignored() {
        assert_eq!(date_from_filename(Path::new("2024-13-40.md")), None);
        assert_eq!(date_from_filename(Path::new("scratch.md")), None);
    }

    #[test]
    fn date_in_directory_name_does_not_count() {
        assert_eq!(date_from_filename(Path::new("2024-01-01/inbox.md")), None);
    }

    #[test]
    fn note_requires_dated_name() {
        assert!(NoteFile::new("inbox.md", "hello").is_none());
        let note = NoteFile::new("2024-05-01.md", "hello").unwrap();
        assert_eq!(note.title(), "2024-05-01");
        assert_eq!(note.hash.len(), 64);
    }

    #[test]
    fn hash_changes_with_content() {
        let a = content_hash(b"- [ ] call Bob");
        let b = content_hash(b"- [ ] call Bob.");
        assert_ne!(a, b);
        assert_eq!(a, content_hash(b"- [ ] call Bob"));
    }

    #[test]
    fn hex_encode() {
        assert_eq!(hex::encode([0x00, 0xab, 0xff]), "00abff");
    }
}
