//! # RPC Layer
//!
//! One method per REST call the client issues. Each call fetches a bearer
//! token, sends through the transport and classifies non-success statuses
//! into `FirestoreError`. Nothing here retries.

use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as Json};

use super::wire::{
    BatchGetItem, BeginTransactionResponse, CommitResponse, DocumentBody, RunQueryItem,
    TransactionId,
};
use crate::auth::TokenProvider;
use crate::errors::{FirestoreError, FirestoreResult};
use crate::path::{DatabaseId, DocumentPath, ResourcePath};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// How a transaction should be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginMode {
    ReadWrite { retry: Option<TransactionId> },
    ReadOnly,
}

/// REST calls against one database
#[derive(Clone)]
pub struct RpcClient {
    base_url: Url,
    database: DatabaseId,
    auth: Arc<dyn TokenProvider>,
    transport: Arc<dyn Transport>,
}

impl RpcClient {
    /// Fails when `base_url` is not an absolute http(s) URL
    pub fn new(
        base_url: &str,
        database: DatabaseId,
        auth: Arc<dyn TokenProvider>,
        transport: Arc<dyn Transport>,
    ) -> FirestoreResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| FirestoreError::usage(format!("invalid base url {}", base_url)))?;
        Ok(Self {
            base_url,
            database,
            auth,
            transport,
        })
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn root_url(&self, action: &str) -> String {
        resource_url(&self.base_url, &self.database.documents_root(), Some(action))
    }

    /// Read one document; `None` when it does not exist
    pub async fn get_document(
        &self,
        path: &DocumentPath,
        transaction: Option<&TransactionId>,
    ) -> FirestoreResult<Option<DocumentBody>> {
        let url = resource_url(&self.base_url, &path.resource_name(), None);
        let mut request = HttpRequest::get(url);
        if let Some(id) = transaction {
            request = request.query("transaction", id.as_str());
        }

        match self.call(request).await {
            Ok(body) => parse(body).map(Some),
            Err(FirestoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Read several documents in one round trip
    pub async fn batch_get(
        &self,
        paths: &[DocumentPath],
        transaction: Option<&TransactionId>,
    ) -> FirestoreResult<Vec<BatchGetItem>> {
        let mut body = json!({
            "documents": paths.iter().map(DocumentPath::resource_name).collect::<Vec<_>>(),
        });
        if let Some(id) = transaction {
            body["transaction"] = json!(id.as_str());
        }

        let request = HttpRequest::post(self.root_url("batchGet")).json(body);
        parse(self.call(request).await?)
    }

    /// Open a transaction and return its handle
    pub async fn begin_transaction(&self, mode: &BeginMode) -> FirestoreResult<TransactionId> {
        let options = match mode {
            BeginMode::ReadOnly => json!({ "readOnly": {} }),
            BeginMode::ReadWrite { retry: Some(id) } => {
                json!({ "readWrite": { "retryTransaction": id.as_str() } })
            }
            BeginMode::ReadWrite { retry: None } => json!({ "readWrite": {} }),
        };

        let request = HttpRequest::post(self.root_url("beginTransaction"))
            .json(json!({ "options": options }));
        let response: BeginTransactionResponse = parse(self.call(request).await?)?;
        Ok(response.transaction)
    }

    /// Apply writes atomically, inside `transaction` when given
    pub async fn commit(
        &self,
        writes: Vec<Json>,
        transaction: Option<&TransactionId>,
    ) -> FirestoreResult<CommitResponse> {
        let mut body = json!({ "writes": writes });
        if let Some(id) = transaction {
            body["transaction"] = json!(id.as_str());
        }

        let request = HttpRequest::post(self.root_url("commit")).json(body);
        parse(self.call(request).await?)
    }

    /// Release a transaction without applying anything
    pub async fn rollback(&self, transaction: &TransactionId) -> FirestoreResult<()> {
        let request = HttpRequest::post(self.root_url("rollback"))
            .json(json!({ "transaction": transaction.as_str() }));
        self.call(request).await.map(|_| ())
    }

    /// Run a structured query under `parent`
    pub async fn run_query(
        &self,
        parent: &ResourcePath,
        structured_query: Json,
        transaction: Option<&TransactionId>,
    ) -> FirestoreResult<Vec<RunQueryItem>> {
        let mut body = json!({ "structuredQuery": structured_query });
        if let Some(id) = transaction {
            body["transaction"] = json!(id.as_str());
        }

        let url = resource_url(&self.base_url, &parent.resource_name(), Some("runQuery"));
        let request = HttpRequest::post(url).json(body);
        parse(self.call(request).await?)
    }

    async fn call(&self, request: HttpRequest) -> FirestoreResult<Json> {
        let token = self.auth.token().await?;
        let method = request.method.as_str();
        let url = request.url.clone();

        let HttpResponse { status, body } = self.transport.send(request.bearer(Some(token))).await?;

        tracing::debug!(method, url = %url, status, "rpc");

        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(FirestoreError::from_response(status, &body))
        }
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("base_url", &self.base_url)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// URL of `resource` under `base`, with `:action` appended to the last
/// segment. Each segment is percent-encoded, so ids holding `#`, `?` or `%`
/// address the document they name.
fn resource_url(base: &Url, resource: &str, action: Option<&str>) -> String {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty();
        let mut parts = resource.split('/').peekable();
        while let Some(part) = parts.next() {
            match action {
                Some(action) if parts.peek().is_none() => {
                    segments.push(&format!("{}:{}", part, action));
                }
                _ => {
                    segments.push(part);
                }
            }
        }
    }
    url.into()
}

fn parse<T: DeserializeOwned>(body: Json) -> FirestoreResult<T> {
    serde_json::from_value(body)
        .map_err(|e| FirestoreError::Transport(TransportError::InvalidResponse(e.to_string())))
}
