//! Frontmatter parsing and rendering.
//!
//! Values are decoded with `serde_yaml`, one top-level key at a time, so
//! quoting, flow lists and comments follow real YAML rules. The source text
//! of every key is kept alongside its value: rendering writes untouched keys,
//! comments and blank lines back byte-for-byte and only re-emits the keys
//! that were changed. Artifact files only use scalars and flat lists; a
//! nested mapping is reported as an error rather than flattened.

use std::fmt::Write as _;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

const DELIMITER: &str = "---";

/// Errors from parsing a frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    /// The opening `---` has no matching closing delimiter.
    #[error("frontmatter is not terminated")]
    Unterminated,

    /// A top-level line is neither `key: value` nor part of one.
    #[error("malformed frontmatter line {line}: {content}")]
    Malformed { line: usize, content: String },

    /// A key's value is not valid YAML, or not a scalar or flat list.
    #[error("frontmatter key `{key}`: {message}")]
    Invalid { key: String, message: String },

    #[error("duplicate frontmatter key `{0}`")]
    DuplicateKey(String),
}

/// A frontmatter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Returns true for an empty scalar or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    key: String,
    value: FieldValue,
    /// Source lines of the key; `None` once the value has been changed.
    raw: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Field(Field),
    /// Comment and blank lines, kept verbatim.
    Trivia(String),
}

/// Ordered key/value metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    entries: Vec<Entry>,
}

impl Frontmatter {
    /// Creates an empty frontmatter block.
    pub fn new() -> Self {
        Self::default()
    }

    fn fields(&self) -> impl Iterator<Item = &Field> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Field(field) => Some(field),
            Entry::Trivia(_) => None,
        })
    }

    fn field_mut(&mut self, key: &str) -> Option<&mut Field> {
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Field(field) if field.key == key => Some(field),
            _ => None,
        })
    }

    /// Returns the value for a key.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Returns a scalar value, if the key holds one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            FieldValue::Scalar(s) => Some(s.as_str()),
            FieldValue::List(_) => None,
        }
    }

    /// Returns list items; a scalar is treated as a one-item list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(FieldValue::List(items)) => items.clone(),
            Some(FieldValue::Scalar(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Sets a value, keeping the key's position if it already exists.
    ///
    /// Setting a key to the value it already holds keeps its source text.
    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        let key = key.into();
        match self.field_mut(&key) {
            Some(field) => {
                if field.value != value {
                    field.value = value;
                    field.raw = None;
                }
            }
            None => self.entries.push(Entry::Field(Field {
                key,
                value,
                raw: None,
            })),
        }
    }

    /// Sets a scalar value.
    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, FieldValue::Scalar(value.into()));
    }

    /// Sets a list value.
    pub fn set_list(&mut self, key: impl Into<String>, items: Vec<String>) {
        self.set(key, FieldValue::List(items));
    }

    /// Builder: scalar field.
    #[must_use]
    pub fn with_str(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_str(key, value);
        self
    }

    /// Builder: list field.
    #[must_use]
    pub fn with_list(mut self, key: impl Into<String>, items: Vec<String>) -> Self {
        self.set_list(key, items);
        self
    }

    /// Iterates fields in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields().map(|f| (f.key.as_str(), &f.value))
    }

    /// Returns true if the block holds nothing, not even a comment.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses the text between the delimiters.
    pub fn parse(block: &str) -> Result<Self, FrontmatterError> {
        let mut entries = Vec::new();
        // Comment and blank lines whose owner is not known yet.
        let mut pending = String::new();
        let mut open: Option<Field> = None;

        for (idx, line) in block.split_inclusive('\n').enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                pending.push_str(line);
                continue;
            }

            let continues = line.starts_with([' ', '\t']) || trimmed == "-" || trimmed.starts_with("- ");
            if continues {
                let Some(raw) = open.as_mut().and_then(|f| f.raw.as_mut()) else {
                    return Err(malformed(idx, line));
                };
                raw.push_str(&pending);
                raw.push_str(line);
                pending.clear();
                continue;
            }

            let Some(key) = top_level_key(line) else {
                return Err(malformed(idx, line));
            };
            entries.extend(open.take().map(Entry::Field));
            if !pending.is_empty() {
                entries.push(Entry::Trivia(std::mem::take(&mut pending)));
            }
            let duplicate = entries
                .iter()
                .any(|e| matches!(e, Entry::Field(f) if f.key == key));
            if duplicate {
                return Err(FrontmatterError::DuplicateKey(key));
            }
            open = Some(Field {
                key,
                value: FieldValue::Scalar(String::new()),
                raw: Some(line.to_string()),
            });
        }
        entries.extend(open.take().map(Entry::Field));
        if !pending.is_empty() {
            entries.push(Entry::Trivia(pending));
        }

        for entry in &mut entries {
            if let Entry::Field(field) = entry {
                let raw = field.raw.as_deref().unwrap_or_default();
                field.value = decode(&field.key, raw)?;
            }
        }
        Ok(Self { entries })
    }

    /// Renders the block including both delimiters and a trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::from(DELIMITER);
        out.push('\n');
        for entry in &self.entries {
            match entry {
                Entry::Trivia(text) | Entry::Field(Field { raw: Some(text), .. }) => {
                    out.push_str(text);
                    if !text.ends_with('\n') {
                        out.push('\n');
                    }
                }
                Entry::Field(Field {
                    key,
                    value,
                    raw: None,
                }) => render_field(&mut out, key, value),
            }
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out
    }
}

fn render_field(out: &mut String, key: &str, value: &FieldValue) {
    match value {
        FieldValue::Scalar(s) => {
            let _ = writeln!(out, "{}: {}", key, quote(s));
        }
        FieldValue::List(items) if items.is_empty() => {
            let _ = writeln!(out, "{}: []", key);
        }
        FieldValue::List(items) => {
            let _ = writeln!(out, "{}:", key);
            for item in items {
                let _ = writeln!(out, "  - {}", quote(item));
            }
        }
    }
}

/// A markdown document split into frontmatter and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Document {
    /// Creates a document from parts.
    pub fn new(frontmatter: Frontmatter, body: impl Into<String>) -> Self {
        Self {
            frontmatter,
            body: body.into(),
        }
    }

    /// Parses a full document. Text without a leading `---` is all body.
    pub fn parse(text: &str) -> Result<Self, FrontmatterError> {
        match split_frontmatter(text)? {
            Some((block, body)) => Ok(Self {
                frontmatter: Frontmatter::parse(block)?,
                body: body.to_string(),
            }),
            None => Ok(Self {
                frontmatter: Frontmatter::new(),
                body: text.to_string(),
            }),
        }
    }

    /// Renders frontmatter followed by the body.
    pub fn render(&self) -> String {
        if self.frontmatter.is_empty() {
            return self.body.clone();
        }
        let mut out = self.frontmatter.render();
        if !self.body.is_empty() && !self.body.starts_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.body);
        out
    }
}

/// Splits `---\n...\n---\n` from the rest of the document.
///
/// Returns `Ok(None)` if the document has no frontmatter.
pub fn split_frontmatter(text: &str) -> Result<Option<(&str, &str)>, FrontmatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(rest) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return Ok(None);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let block = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Some((block, body)));
        }
        offset += line.len();
    }
    Err(FrontmatterError::Unterminated)
}

fn malformed(idx: usize, line: &str) -> FrontmatterError {
    FrontmatterError::Malformed {
        line: idx + 1,
        content: line.trim_end().to_string(),
    }
}

/// Key of an unindented `key: value` or bare `key:` line.
fn top_level_key(line: &str) -> Option<String> {
    let (key, rest) = line.split_once(':')?;
    let separated = rest.is_empty() || rest.starts_with(char::is_whitespace);
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ' '));
    (separated && valid).then(|| key.trim().to_string())
}

/// Decodes one key's source lines into a value.
fn decode(key: &str, raw: &str) -> Result<FieldValue, FrontmatterError> {
    let invalid = |message: &str| FrontmatterError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    };
    let mapping: Mapping = serde_yaml::from_str(raw).map_err(|e| invalid(&e.to_string()))?;
    if mapping.len() != 1 {
        return Err(invalid("expected a single key"));
    }
    let value = mapping.into_iter().next().map_or(Value::Null, |(_, v)| v);

    match value {
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| scalar_text(item).ok_or_else(|| invalid("nested values are not supported")))
            .collect::<Result<_, _>>()
            .map(FieldValue::List),
        other => scalar_text(other)
            .map(FieldValue::Scalar)
            .ok_or_else(|| invalid("nested values are not supported")),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Writes a value plain when YAML reads it back as the same string.
fn quote(value: &str) -> String {
    let plain = !value.is_empty()
        && !value.contains('\n')
        && matches!(serde_yaml::from_str::<Value>(value), Ok(Value::String(s)) if s == value);
    if plain {
        value.to_string()
    } else {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n");
        format!("\"{}\"", escaped)
    }
}
