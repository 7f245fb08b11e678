//! # Resource Paths
//!
//! A path is an ordered list of segments under a database root. An odd
//! segment count names a collection, an even one a document, zero the root.
//! `DocumentPath` and `CollectionPath` carry that parity in the type so a
//! collection can never be read as a document.

use std::fmt;

use super::database::DatabaseId;
use super::errors::{PathError, PathResult};

/// Any path under a database root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePath {
    database: DatabaseId,
    segments: Vec<String>,
}

impl ResourcePath {
    /// The documents root of a database
    pub fn root(database: DatabaseId) -> Self {
        Self {
            database,
            segments: Vec::new(),
        }
    }

    /// Parse a full resource name
    /// (`projects/{p}/databases/{d}/documents[/seg...]`)
    pub fn parse(name: &str) -> PathResult<Self> {
        let parts: Vec<&str> = name.split('/').collect();
        if parts.len() < 5
            || parts[0] != "projects"
            || parts[2] != "databases"
            || parts[4] != "documents"
            || parts[1].is_empty()
            || parts[3].is_empty()
        {
            return Err(PathError::InvalidPrefix(name.to_string()));
        }

        let database = DatabaseId::new(parts[1], parts[3]);
        let segments = &parts[5..];
        validate_segments(name, segments)?;

        Ok(Self {
            database,
            segments: segments.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Parse a slash-separated path relative to the database root
    pub fn from_relative(database: &DatabaseId, relative: &str) -> PathResult<Self> {
        let trimmed = relative.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root(database.clone()));
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        validate_segments(relative, &segments)?;

        Ok(Self {
            database: database.clone(),
            segments: segments.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_document(&self) -> bool {
        !self.segments.is_empty() && self.segments.len() % 2 == 0
    }

    pub fn is_collection(&self) -> bool {
        self.segments.len() % 2 == 1
    }

    /// Last segment, or `None` on the root
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Exact inverse of `parse`
    pub fn resource_name(&self) -> String {
        let root = self.database.documents_root();
        if self.segments.is_empty() {
            root
        } else {
            format!("{}/{}", root, self.segments.join("/"))
        }
    }

    /// Path relative to the database root, e.g. `users/alice`
    pub fn relative_name(&self) -> String {
        self.segments.join("/")
    }

    /// Append one segment
    pub fn child(&self, segment: &str) -> PathResult<Self> {
        validate_segment(segment, segment, self.segments.len())?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self {
            database: self.database.clone(),
            segments,
        })
    }

    /// Append a slash-separated relative path
    pub fn join(&self, relative: &str) -> PathResult<Self> {
        let extra = ResourcePath::from_relative(&self.database, relative)?;
        let mut segments = self.segments.clone();
        segments.extend(extra.segments);
        Ok(Self {
            database: self.database.clone(),
            segments,
        })
    }

    /// Drop the last segment; fails on the root
    pub fn parent(&self) -> PathResult<Self> {
        if self.segments.is_empty() {
            return Err(PathError::NoParent);
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Ok(Self {
            database: self.database.clone(),
            segments,
        })
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource_name())
    }
}

/// Path to a single document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath(ResourcePath);

impl DocumentPath {
    /// Parse a full document resource name
    pub fn parse(name: &str) -> PathResult<Self> {
        Self::try_from(ResourcePath::parse(name)?)
    }

    /// Parse a path such as `users/alice` under a database root
    pub fn from_relative(database: &DatabaseId, relative: &str) -> PathResult<Self> {
        Self::try_from(ResourcePath::from_relative(database, relative)?)
    }

    pub fn as_resource(&self) -> &ResourcePath {
        &self.0
    }

    pub fn database(&self) -> &DatabaseId {
        self.0.database()
    }

    /// Document id (last segment)
    pub fn id(&self) -> &str {
        self.0.last_segment().unwrap_or_default()
    }

    pub fn resource_name(&self) -> String {
        self.0.resource_name()
    }

    pub fn relative_name(&self) -> String {
        self.0.relative_name()
    }

    /// The collection containing this document
    pub fn parent(&self) -> CollectionPath {
        let mut segments = self.0.segments.clone();
        segments.pop();
        CollectionPath(ResourcePath {
            database: self.0.database.clone(),
            segments,
        })
    }

    /// A subcollection of this document
    pub fn collection(&self, id: &str) -> PathResult<CollectionPath> {
        CollectionPath::try_from(self.0.join(id)?)
    }
}

impl TryFrom<ResourcePath> for DocumentPath {
    type Error = PathError;

    fn try_from(path: ResourcePath) -> PathResult<Self> {
        if path.is_document() {
            Ok(Self(path))
        } else {
            Err(PathError::NotADocument(path.resource_name()))
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Path to a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(ResourcePath);

impl CollectionPath {
    /// Parse a full collection resource name
    pub fn parse(name: &str) -> PathResult<Self> {
        Self::try_from(ResourcePath::parse(name)?)
    }

    /// Parse a path such as `users` or `users/alice/posts`
    pub fn from_relative(database: &DatabaseId, relative: &str) -> PathResult<Self> {
        Self::try_from(ResourcePath::from_relative(database, relative)?)
    }

    pub fn as_resource(&self) -> &ResourcePath {
        &self.0
    }

    pub fn database(&self) -> &DatabaseId {
        self.0.database()
    }

    /// Collection id (last segment)
    pub fn id(&self) -> &str {
        self.0.last_segment().unwrap_or_default()
    }

    pub fn resource_name(&self) -> String {
        self.0.resource_name()
    }

    pub fn relative_name(&self) -> String {
        self.0.relative_name()
    }

    /// The owning document; `None` for top-level collections
    pub fn parent(&self) -> Option<DocumentPath> {
        self.0.parent().ok().and_then(|p| DocumentPath::try_from(p).ok())
    }

    /// The resource queries against this collection are issued under:
    /// the owning document, or the documents root
    pub fn query_parent(&self) -> ResourcePath {
        self.0
            .parent()
            .unwrap_or_else(|_| ResourcePath::root(self.0.database.clone()))
    }

    /// A document in this collection
    pub fn doc(&self, id: &str) -> PathResult<DocumentPath> {
        DocumentPath::try_from(self.0.join(id)?)
    }
}

impl TryFrom<ResourcePath> for CollectionPath {
    type Error = PathError;

    fn try_from(path: ResourcePath) -> PathResult<Self> {
        if path.is_collection() {
            Ok(Self(path))
        } else {
            Err(PathError::NotACollection(path.resource_name()))
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn validate_segments(path: &str, segments: &[&str]) -> PathResult<()> {
    segments
        .iter()
        .enumerate()
        .try_for_each(|(position, segment)| validate_segment(path, segment, position))
}

fn validate_segment(path: &str, segment: &str, position: usize) -> PathResult<()> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment {
            path: path.to_string(),
            position,
        });
    }
    let reserved = segment.len() >= 4 && segment.starts_with("__") && segment.ends_with("__");
    if segment == "." || segment == ".." || segment.contains('/') || reserved {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}
