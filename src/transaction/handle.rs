//! # Transaction Handle
//!
//! What the caller's function receives for one attempt. Reads go to the
//! server under this attempt's transaction id; writes are only buffered
//! and leave the process at commit.
//!
//! A handle is valid only while its attempt is `Active`. After a commit,
//! a retry or a rollback every call through it fails with `Usage`.
//!
//! Reads see the server's state as of the transaction, never this
//! handle's own buffered writes.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::try_join_all;

use super::state::{lock, SharedEngine, TransactionState};
use crate::client::Firestore;
use crate::errors::{FirestoreError, FirestoreResult};
use crate::path::DatabaseId;
use crate::query::Query;
use crate::reference::{DocumentReference, DocumentSnapshot, PendingWrite, Precondition, QuerySnapshot};
use crate::rest::TransactionId;
use crate::value::IntoWriteFields;

/// Transaction-scoped reads and buffered writes
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<TransactionInner>,
}

struct TransactionInner {
    firestore: Firestore,
    id: TransactionId,
    attempt: u32,
    read_only: bool,
    engine: SharedEngine,
    writes: Mutex<Vec<PendingWrite>>,
    reads_in_flight: AtomicUsize,
}

/// Counts a read as in flight until dropped, including when the read's
/// future is abandoned mid-flight
struct ReadGuard<'a>(&'a AtomicUsize);

impl<'a> ReadGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Transaction {
    pub(crate) fn new(
        firestore: Firestore,
        id: TransactionId,
        attempt: u32,
        read_only: bool,
        engine: SharedEngine,
    ) -> Self {
        Self {
            inner: Arc::new(TransactionInner {
                firestore,
                id,
                attempt,
                read_only,
                engine,
                writes: Mutex::new(Vec::new()),
                reads_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Server-issued id of this attempt
    pub fn id(&self) -> &TransactionId {
        &self.inner.id
    }

    /// 1-based attempt number; greater than 1 means the function is being
    /// rerun after contention
    pub fn attempt(&self) -> u32 {
        self.inner.attempt
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.read_only
    }

    /// Number of buffered writes
    pub fn pending_writes(&self) -> usize {
        lock(&self.inner.writes).len()
    }

    pub(crate) fn firestore(&self) -> &Firestore {
        &self.inner.firestore
    }

    // ==================
    // Reads
    // ==================

    /// Read a document within this transaction
    pub async fn get(&self, doc: &DocumentReference) -> FirestoreResult<DocumentSnapshot> {
        self.ensure_active()?;
        self.check_database(doc.path().database())?;

        let _read = ReadGuard::new(&self.inner.reads_in_flight);
        let body = self
            .inner
            .firestore
            .rpc()
            .get_document(doc.path(), Some(&self.inner.id))
            .await?;

        match body {
            Some(body) => DocumentSnapshot::from_body(&body, None),
            None => DocumentSnapshot::missing(doc.path().clone(), None),
        }
    }

    /// Read several documents concurrently; results follow `docs` order
    pub async fn get_all(&self, docs: &[DocumentReference]) -> FirestoreResult<Vec<DocumentSnapshot>> {
        try_join_all(docs.iter().map(|doc| self.get(doc))).await
    }

    /// Run a query within this transaction; its results join the read set
    pub async fn query(&self, query: &Query) -> FirestoreResult<QuerySnapshot> {
        self.ensure_active()?;
        self.check_database(query.firestore().database())?;

        let _read = ReadGuard::new(&self.inner.reads_in_flight);
        query.execute(Some(&self.inner.id)).await
    }

    // ==================
    // Buffered Writes
    // ==================

    /// Buffer a full replace of `doc`
    pub fn set(&self, doc: &DocumentReference, data: impl IntoWriteFields) -> FirestoreResult<()> {
        self.buffer(PendingWrite::Set {
            path: doc.path().clone(),
            data: data.into_write_fields(),
            merge: false,
            precondition: None,
        })
    }

    /// Buffer a merge of the given top-level fields
    pub fn set_merge(&self, doc: &DocumentReference, data: impl IntoWriteFields) -> FirestoreResult<()> {
        self.buffer(PendingWrite::Set {
            path: doc.path().clone(),
            data: data.into_write_fields(),
            merge: true,
            precondition: None,
        })
    }

    /// Buffer a create; the commit fails with `AlreadyExists` if `doc` exists
    pub fn create(&self, doc: &DocumentReference, data: impl IntoWriteFields) -> FirestoreResult<()> {
        self.buffer(PendingWrite::Set {
            path: doc.path().clone(),
            data: data.into_write_fields(),
            merge: false,
            precondition: Some(Precondition::Exists(false)),
        })
    }

    /// Buffer an update of the given (dotted) field paths
    pub fn update(&self, doc: &DocumentReference, data: impl IntoWriteFields) -> FirestoreResult<()> {
        let precondition = self.inner.firestore.write_policy().update_precondition(None);
        self.buffer(PendingWrite::Update {
            path: doc.path().clone(),
            data: data.into_write_fields(),
            precondition,
        })
    }

    pub fn update_with(
        &self,
        doc: &DocumentReference,
        data: impl IntoWriteFields,
        precondition: Precondition,
    ) -> FirestoreResult<()> {
        self.buffer(PendingWrite::Update {
            path: doc.path().clone(),
            data: data.into_write_fields(),
            precondition: Some(precondition),
        })
    }

    pub fn delete(&self, doc: &DocumentReference) -> FirestoreResult<()> {
        let precondition = self.inner.firestore.write_policy().delete_precondition(None);
        self.buffer(PendingWrite::Delete {
            path: doc.path().clone(),
            precondition,
        })
    }

    pub fn delete_with(&self, doc: &DocumentReference, precondition: Precondition) -> FirestoreResult<()> {
        self.buffer(PendingWrite::Delete {
            path: doc.path().clone(),
            precondition: Some(precondition),
        })
    }

    fn buffer(&self, write: PendingWrite) -> FirestoreResult<()> {
        self.ensure_active()?;
        if self.inner.read_only {
            return Err(FirestoreError::usage(format!(
                "{} in a read-only transaction",
                write.kind()
            )));
        }
        self.check_database(write.path().database())?;

        // Surface encoding errors at the call site rather than at commit
        write.to_json()?;

        tracing::debug!(
            kind = write.kind(),
            path = %write.path(),
            attempt = self.inner.attempt,
            "write_buffered"
        );
        lock(&self.inner.writes).push(write);
        Ok(())
    }

    // ==================
    // Engine Hooks
    // ==================

    /// Move to `Committing` and hand over the buffered writes in issue order
    pub(crate) fn prepare_commit(&self) -> FirestoreResult<Vec<PendingWrite>> {
        let mut engine = lock(&self.inner.engine);
        if !engine.state.is_active_for(self.inner.attempt) {
            return Err(self.inactive_error(engine.state));
        }
        let in_flight = self.inner.reads_in_flight.load(Ordering::SeqCst);
        if in_flight > 0 {
            return Err(FirestoreError::usage(format!(
                "commit with {} read(s) still in flight; await every read first",
                in_flight
            )));
        }
        engine.advance(TransactionState::commit)?;
        drop(engine);

        Ok(std::mem::take(&mut *lock(&self.inner.writes)))
    }

    fn ensure_active(&self) -> FirestoreResult<()> {
        let engine = lock(&self.inner.engine);
        if engine.state.is_active_for(self.inner.attempt) {
            Ok(())
        } else {
            Err(self.inactive_error(engine.state))
        }
    }

    fn inactive_error(&self, state: TransactionState) -> FirestoreError {
        FirestoreError::usage(format!(
            "transaction handle from attempt {} used after its attempt ended (now {} in attempt {})",
            self.inner.attempt,
            state.state_name(),
            state.attempt()
        ))
    }

    fn check_database(&self, database: &DatabaseId) -> FirestoreResult<()> {
        self.inner.firestore.check_database(database)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.inner.id)
            .field("attempt", &self.inner.attempt)
            .field("read_only", &self.inner.read_only)
            .field("pending_writes", &self.pending_writes())
            .finish()
    }
}
