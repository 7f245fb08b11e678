//! # Collection References

use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;

use super::document::DocumentReference;
use super::snapshot::QuerySnapshot;
use crate::client::Firestore;
use crate::errors::FirestoreResult;
use crate::path::CollectionPath;
use crate::query::{Direction, FilterOperator, Query};
use crate::value::{IntoWriteFields, Value};

/// Length of generated document ids
pub const AUTO_ID_LENGTH: usize = 20;

/// Random alphanumeric document id
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Handle for one collection
#[derive(Clone)]
pub struct CollectionReference {
    firestore: Firestore,
    path: CollectionPath,
}

impl CollectionReference {
    pub(crate) fn new(firestore: Firestore, path: CollectionPath) -> Self {
        Self { firestore, path }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// The owning document; `None` for top-level collections
    pub fn parent(&self) -> Option<DocumentReference> {
        self.path
            .parent()
            .map(|p| DocumentReference::new(self.firestore.clone(), p))
    }

    pub fn doc(&self, id: &str) -> FirestoreResult<DocumentReference> {
        Ok(DocumentReference::new(
            self.firestore.clone(),
            self.path.doc(id)?,
        ))
    }

    /// A document with a freshly generated id
    pub fn doc_auto(&self) -> FirestoreResult<DocumentReference> {
        self.doc(&auto_id())
    }

    /// Create a document with a generated id
    pub async fn add(&self, data: impl IntoWriteFields) -> FirestoreResult<DocumentReference> {
        let data = data.into_write_fields();
        let doc = self.doc_auto()?;
        doc.create(data).await?;
        Ok(doc)
    }

    /// Unfiltered query over this collection
    pub fn query(&self) -> Query {
        Query::new(self.firestore.clone(), self.path.clone())
    }

    pub fn where_field(
        &self,
        field: &str,
        op: FilterOperator,
        value: impl Into<Value>,
    ) -> FirestoreResult<Query> {
        self.query().where_field(field, op, value)
    }

    pub fn order_by(&self, field: &str, direction: Direction) -> FirestoreResult<Query> {
        self.query().order_by(field, direction)
    }

    pub fn limit(&self, limit: u32) -> Query {
        self.query().limit(limit)
    }

    /// Every document in the collection
    pub async fn get(&self) -> FirestoreResult<QuerySnapshot> {
        self.query().get().await
    }
}

impl PartialEq for CollectionReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl fmt::Debug for CollectionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CollectionReference").field(&self.path).finish()
    }
}
