//! # Database Identity

use std::fmt;

use serde::{Deserialize, Serialize};

/// Database used when none is configured
pub const DEFAULT_DATABASE: &str = "(default)";

/// A project/database pair every resource path is rooted at
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseId {
    project_id: String,
    database_id: String,
}

impl DatabaseId {
    pub fn new(project_id: impl Into<String>, database_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
        }
    }

    /// The `(default)` database of a project
    pub fn default_for(project_id: impl Into<String>) -> Self {
        Self::new(project_id, DEFAULT_DATABASE)
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// `projects/{p}/databases/{d}`
    pub fn resource_name(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database_id)
    }

    /// `projects/{p}/databases/{d}/documents`, the root all paths hang off
    pub fn documents_root(&self) -> String {
        format!("{}/documents", self.resource_name())
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_root() {
        let db = DatabaseId::default_for("demo");
        assert_eq!(db.documents_root(), "projects/demo/databases/(default)/documents");
    }
}
