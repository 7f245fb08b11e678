//! # Document References
//!
//! Addressable handles for one document. Every write here is its own
//! single-write commit outside any transaction; nothing is retried.

use std::fmt;

use serde::Serialize;

use super::collection::CollectionReference;
use super::snapshot::{parse_time, DocumentSnapshot};
use super::write::{PendingWrite, Precondition};
use crate::client::Firestore;
use crate::errors::{FirestoreError, FirestoreResult};
use crate::path::DocumentPath;
use crate::transport::TransportError;
use crate::value::{to_fields, IntoWriteFields, Timestamp};

/// Handle for one document
#[derive(Clone)]
pub struct DocumentReference {
    firestore: Firestore,
    path: DocumentPath,
}

impl DocumentReference {
    pub(crate) fn new(firestore: Firestore, path: DocumentPath) -> Self {
        Self { firestore, path }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn path(&self) -> &DocumentPath {
        &self.path
    }

    pub fn firestore(&self) -> &Firestore {
        &self.firestore
    }

    /// The collection containing this document
    pub fn parent(&self) -> CollectionReference {
        CollectionReference::new(self.firestore.clone(), self.path.parent())
    }

    /// A subcollection of this document
    pub fn collection(&self, id: &str) -> FirestoreResult<CollectionReference> {
        Ok(CollectionReference::new(
            self.firestore.clone(),
            self.path.collection(id)?,
        ))
    }

    /// Read the document; a missing document yields `exists() == false`
    pub async fn get(&self) -> FirestoreResult<DocumentSnapshot> {
        match self.firestore.rpc().get_document(&self.path, None).await? {
            Some(body) => DocumentSnapshot::from_body(&body, None),
            None => DocumentSnapshot::missing(self.path.clone(), None),
        }
    }

    /// Replace the document, creating it if needed
    pub async fn set(&self, data: impl IntoWriteFields) -> FirestoreResult<Timestamp> {
        self.commit_one(PendingWrite::Set {
            path: self.path.clone(),
            data: data.into_write_fields(),
            merge: false,
            precondition: None,
        })
        .await
    }

    /// Store a serialisable value as the whole document
    pub async fn set_from<T: Serialize + ?Sized>(&self, value: &T) -> FirestoreResult<Timestamp> {
        let fields = to_fields(value)?;
        self.set(fields).await
    }

    /// Write only the given top-level fields, keeping the rest
    pub async fn set_merge(&self, data: impl IntoWriteFields) -> FirestoreResult<Timestamp> {
        self.commit_one(PendingWrite::Set {
            path: self.path.clone(),
            data: data.into_write_fields(),
            merge: true,
            precondition: None,
        })
        .await
    }

    /// Create the document; `AlreadyExists` if it is already there
    pub async fn create(&self, data: impl IntoWriteFields) -> FirestoreResult<Timestamp> {
        self.commit_one(PendingWrite::Set {
            path: self.path.clone(),
            data: data.into_write_fields(),
            merge: false,
            precondition: Some(Precondition::Exists(false)),
        })
        .await
    }

    /// Change the given (dotted) field paths.
    ///
    /// On a missing document this fails with `NotFound` unless the client
    /// was configured with `update_must_exist = false`.
    pub async fn update(&self, data: impl IntoWriteFields) -> FirestoreResult<Timestamp> {
        let precondition = self.firestore.write_policy().update_precondition(None);
        self.commit_one(PendingWrite::Update {
            path: self.path.clone(),
            data: data.into_write_fields(),
            precondition,
        })
        .await
    }

    /// `update` guarded by an explicit precondition
    pub async fn update_with(
        &self,
        data: impl IntoWriteFields,
        precondition: Precondition,
    ) -> FirestoreResult<Timestamp> {
        self.commit_one(PendingWrite::Update {
            path: self.path.clone(),
            data: data.into_write_fields(),
            precondition: Some(precondition),
        })
        .await
    }

    /// Delete the document
    pub async fn delete(&self) -> FirestoreResult<Timestamp> {
        let precondition = self.firestore.write_policy().delete_precondition(None);
        self.commit_one(PendingWrite::Delete {
            path: self.path.clone(),
            precondition,
        })
        .await
    }

    /// `delete` guarded by an explicit precondition
    pub async fn delete_with(&self, precondition: Precondition) -> FirestoreResult<Timestamp> {
        self.commit_one(PendingWrite::Delete {
            path: self.path.clone(),
            precondition: Some(precondition),
        })
        .await
    }

    async fn commit_one(&self, write: PendingWrite) -> FirestoreResult<Timestamp> {
        let encoded = write.to_json()?;
        let response = self.firestore.rpc().commit(vec![encoded], None).await?;

        tracing::debug!(kind = write.kind(), path = %self.path, "document_write");

        let time = response
            .write_results
            .first()
            .and_then(|r| r.update_time.as_deref())
            .or(response.commit_time.as_deref());
        parse_time(time)?.ok_or_else(|| {
            FirestoreError::Transport(TransportError::InvalidResponse(
                "commit response carries no update time".to_string(),
            ))
        })
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl fmt::Debug for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DocumentReference").field(&self.path).finish()
    }
}
