//! # Firestore Client
//!
//! The public entry point. A `Firestore` is a cheap handle around shared
//! state (config, RPC client, token provider); clone it freely across tasks.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::config::ClientConfig;
use crate::auth::{ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
use crate::errors::{FirestoreError, FirestoreResult};
use crate::path::{CollectionPath, DatabaseId, DocumentPath};
use crate::reference::{CollectionReference, DocumentReference, DocumentSnapshot, WritePolicy};
use crate::rest::RpcClient;
use crate::transaction::{self, Transaction, TransactionOptions};
use crate::transport::{ReqwestTransport, Transport};

/// Client for one database
#[derive(Clone)]
pub struct Firestore {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    database: DatabaseId,
    rpc: RpcClient,
}

impl Firestore {
    /// Build a client from explicit collaborators
    pub fn new(
        config: ClientConfig,
        auth: Arc<dyn TokenProvider>,
        transport: Arc<dyn Transport>,
    ) -> FirestoreResult<Self> {
        config.validate()?;
        let database = config.database();
        let rpc = RpcClient::new(&config.base_url(), database.clone(), auth, transport)?;

        tracing::debug!(
            database = %database,
            base_url = %config.base_url(),
            emulator = config.is_emulator(),
            "client_created"
        );

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                database,
                rpc,
            }),
        })
    }

    /// Connect with service-account credentials over HTTPS
    pub fn with_service_account(
        project_id: impl Into<String>,
        key: &ServiceAccountKey,
    ) -> FirestoreResult<Self> {
        Self::from_service_account_config(ClientConfig::new(project_id), key)
    }

    /// Like `with_service_account`, with a full config
    pub fn from_service_account_config(
        config: ClientConfig,
        key: &ServiceAccountKey,
    ) -> FirestoreResult<Self> {
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let auth = Arc::new(ServiceAccountTokenProvider::new(key, transport.clone())?);
        Self::new(config, auth, transport)
    }

    /// Connect to a local emulator (`host:port`)
    pub fn with_emulator(host: impl Into<String>, project_id: impl Into<String>) -> FirestoreResult<Self> {
        let config = ClientConfig::new(project_id).with_emulator(host);
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        Self::new(config, Arc::new(StaticTokenProvider::emulator()), transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn database(&self) -> &DatabaseId {
        &self.inner.database
    }

    pub(crate) fn rpc(&self) -> &RpcClient {
        &self.inner.rpc
    }

    pub(crate) fn write_policy(&self) -> WritePolicy {
        self.inner.config.write_policy()
    }

    /// Reject paths that belong to another database
    pub(crate) fn check_database(&self, database: &DatabaseId) -> FirestoreResult<()> {
        if database == self.database() {
            Ok(())
        } else {
            Err(FirestoreError::usage(format!(
                "path belongs to {}, client is bound to {}",
                database,
                self.database()
            )))
        }
    }

    /// Reference a collection by relative path (`users`, `users/alice/posts`)
    /// or full resource name
    pub fn collection(&self, path: &str) -> FirestoreResult<CollectionReference> {
        let path = if path.starts_with("projects/") {
            CollectionPath::parse(path)?
        } else {
            CollectionPath::from_relative(self.database(), path)?
        };
        self.check_database(path.database())?;
        Ok(CollectionReference::new(self.clone(), path))
    }

    /// Reference a document by relative path (`users/alice`) or full
    /// resource name
    pub fn doc(&self, path: &str) -> FirestoreResult<DocumentReference> {
        let path = if path.starts_with("projects/") {
            DocumentPath::parse(path)?
        } else {
            DocumentPath::from_relative(self.database(), path)?
        };
        self.doc_at(path)
    }

    /// Reference the document at an already parsed path, such as a
    /// snapshot's
    pub fn doc_at(&self, path: DocumentPath) -> FirestoreResult<DocumentReference> {
        self.check_database(path.database())?;
        Ok(DocumentReference::new(self.clone(), path))
    }

    /// Read several documents in one round trip, outside any transaction.
    /// Results come back in the order of `docs`.
    pub async fn get_all(&self, docs: &[DocumentReference]) -> FirestoreResult<Vec<DocumentSnapshot>> {
        let paths = docs
            .iter()
            .map(|d| {
                self.check_database(d.path().database())?;
                Ok(d.path().clone())
            })
            .collect::<FirestoreResult<Vec<_>>>()?;
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let items = self.rpc().batch_get(&paths, None).await?;

        let mut by_name = HashMap::with_capacity(items.len());
        for item in &items {
            let read_time = item.read_time.as_deref();
            let snapshot = match (&item.found, &item.missing) {
                (Some(body), _) => DocumentSnapshot::from_body(body, read_time)?,
                (None, Some(name)) => DocumentSnapshot::missing(DocumentPath::parse(name)?, read_time)?,
                (None, None) => continue,
            };
            by_name.insert(snapshot.path().resource_name(), snapshot);
        }

        paths
            .iter()
            .map(|path| match by_name.get(&path.resource_name()) {
                Some(snapshot) => Ok(snapshot.clone()),
                None => DocumentSnapshot::missing(path.clone(), None),
            })
            .collect()
    }

    /// Run `f` in a read-write transaction with default options.
    ///
    /// See [`Firestore::run_transaction_with`] for the retry contract.
    pub async fn run_transaction<F, Fut, T>(&self, f: F) -> FirestoreResult<T>
    where
        F: FnMut(Transaction) -> Fut,
        Fut: Future<Output = FirestoreResult<T>>,
    {
        self.run_transaction_with(TransactionOptions::default(), f).await
    }

    /// Run `f` inside a transaction, retrying on contention.
    ///
    /// **`f` may run more than once.** When the server reports that the
    /// transaction's reads were invalidated by a concurrent writer, the
    /// buffered writes are discarded, a fresh transaction is begun and `f`
    /// is invoked again from scratch, up to `options.max_attempts` times.
    /// `f` must therefore have no side effects outside the `Transaction`
    /// it is given: no external I/O, no mutation of captured state that a
    /// rerun would double-apply.
    ///
    /// Writes made through the `Transaction` are buffered locally and sent
    /// in one commit after `f` returns `Ok`. Reads issued after a write to
    /// the same document return the server's state, not the buffered write.
    ///
    /// Returns `f`'s value once the commit succeeds; `TransactionAborted`
    /// when contention persists through every attempt; `Cancelled` on
    /// cancellation or timeout; otherwise the first non-contention error,
    /// after a best-effort rollback.
    pub async fn run_transaction_with<F, Fut, T>(
        &self,
        options: TransactionOptions,
        f: F,
    ) -> FirestoreResult<T>
    where
        F: FnMut(Transaction) -> Fut,
        Fut: Future<Output = FirestoreResult<T>>,
    {
        transaction::run(self, options, f).await
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("database", &self.inner.database)
            .field("rpc", &self.inner.rpc)
            .finish()
    }
}
