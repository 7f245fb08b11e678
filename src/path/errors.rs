//! # Path Errors
//!
//! Malformed resource and field paths. These are detected locally and never
//! sent over the wire.

use thiserror::Error;

/// Result type for path operations
pub type PathResult<T> = Result<T, PathError>;

/// Resource/field path errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Name does not start with `projects/{p}/databases/{d}/documents`
    #[error("Invalid resource name prefix: {0}")]
    InvalidPrefix(String),

    /// A segment is empty (e.g. `users//alice`)
    #[error("Empty segment at position {position} in '{path}'")]
    EmptySegment { path: String, position: usize },

    /// A segment is reserved or otherwise not a legal id
    #[error("Invalid segment '{0}'")]
    InvalidSegment(String),

    /// Expected a document path (even number of segments)
    #[error("Not a document path: {0}")]
    NotADocument(String),

    /// Expected a collection path (odd number of segments)
    #[error("Not a collection path: {0}")]
    NotACollection(String),

    /// `parent()` on the database root
    #[error("Root path has no parent")]
    NoParent,

    /// Field path could not be parsed
    #[error("Invalid field path '{0}'")]
    InvalidFieldPath(String),
}
