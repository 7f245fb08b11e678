//! # Wire Payloads
//!
//! Serde shapes of the REST resources this client exchanges. Field values
//! stay raw JSON here; the value codec decodes them explicitly so an
//! unknown value kind surfaces as a `CodecError` instead of a serde error.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// Server-issued opaque transaction token (base64 text)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document resource
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBody {
    pub name: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Json>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// `beginTransaction` response
#[derive(Debug, Clone, Deserialize)]
pub struct BeginTransactionResponse {
    pub transaction: TransactionId,
}

/// Result of one write in a commit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    #[serde(default)]
    pub update_time: Option<String>,

    #[serde(default)]
    pub transform_results: Vec<Json>,
}

/// `commit` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    #[serde(default)]
    pub write_results: Vec<WriteResult>,

    #[serde(default)]
    pub commit_time: Option<String>,
}

/// One element of a `batchGet` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetItem {
    #[serde(default)]
    pub found: Option<DocumentBody>,

    #[serde(default)]
    pub missing: Option<String>,

    #[serde(default)]
    pub read_time: Option<String>,
}

/// One element of a `runQuery` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryItem {
    #[serde(default)]
    pub document: Option<DocumentBody>,

    #[serde(default)]
    pub read_time: Option<String>,

    #[serde(default)]
    pub transaction: Option<TransactionId>,
}
