//! # Field Paths
//!
//! Dotted paths into a document's nested maps (`address.city`). Segments
//! that are not simple identifiers are written with backticks on the wire.

use std::fmt;

use super::errors::{PathError, PathResult};

/// Path to a (possibly nested) field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build from literal segments; no dot splitting is applied
    pub fn new<I, S>(segments: I) -> PathResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(PathError::InvalidFieldPath(segments.join(".")));
        }
        Ok(Self { segments })
    }

    /// Parse a dotted path; backtick-quoted segments may contain dots
    pub fn parse(text: &str) -> PathResult<Self> {
        let invalid = || PathError::InvalidFieldPath(text.to_string());
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut was_quoted = false;
        let mut chars = text.chars();

        while let Some(c) = chars.next() {
            match c {
                '`' => {
                    quoted = !quoted;
                    was_quoted = true;
                }
                '\\' if quoted => current.push(chars.next().ok_or_else(invalid)?),
                '.' if !quoted => {
                    if current.is_empty() && !was_quoted {
                        return Err(invalid());
                    }
                    segments.push(std::mem::take(&mut current));
                    was_quoted = false;
                }
                c => current.push(c),
            }
        }

        if quoted || (current.is_empty() && !was_quoted) {
            return Err(invalid());
        }
        segments.push(current);
        Self::new(segments).map_err(|_| invalid())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, the top-level field name
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// Canonical wire form, quoting segments as needed
    pub fn canonical(&self) -> String {
        self.segments
            .iter()
            .map(|s| quote_segment(s))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

fn is_simple(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_segment(segment: &str) -> String {
    if is_simple(segment) {
        return segment.to_string();
    }
    let escaped = segment.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{}`", escaped)
}
