//! Core types: notes, date ranges, markdown parsing, extractors, summaries

pub mod contact;
pub mod format;
pub mod frontmatter;
pub mod links;
pub mod meeting;
pub mod note;
pub mod range;
pub mod summary;
pub mod text;
pub mod tracing;

pub use contact::{
    ContactExtraction, ContactKind, ExtractionMode, ParsedContact, canonicalize_company,
    extract_contacts, normalize_phone,
};
pub use format::{FormatOptions, JsonOutput, OutputFormat, OutputFormatter, ellipsis};
pub use frontmatter::{Document, FieldValue, Frontmatter, FrontmatterError};
pub use links::{UrlKind, classify_url, extract_urls};
pub use meeting::{ExtraSection, MeetingBlock, extract_meetings};
pub use note::{NoteFile, content_hash, date_from_filename};
pub use range::{DateRange, ParseScopeError, Scope, resolve_range};
pub use summary::{
    EntityCounts, NoteCounts, NoteFailure, Outcome, RunSummary, StatusReport, TaskCounts,
};
pub use tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
