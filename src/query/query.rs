//! # Queries
//!
//! `StructuredQuery` is the pure translation of chained `where`/`order_by`/
//! `limit` calls into the wire form. `Query` binds one to a client so it
//! can be executed directly or inside a transaction.

use serde_json::{json, Map, Value as Json};

use super::filter::{conjunction, FieldFilter, FilterOperator};
use crate::client::Firestore;
use crate::errors::FirestoreResult;
use crate::path::{CollectionPath, FieldPath};
use crate::reference::snapshot::parse_time;
use crate::reference::{DocumentSnapshot, QuerySnapshot};
use crate::rest::TransactionId;
use crate::value::Value;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }
}

/// Filters, ordering and limit over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    collection_id: String,
    filters: Vec<FieldFilter>,
    order_by: Vec<(FieldPath, Direction)>,
    limit: Option<u32>,
}

impl StructuredQuery {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, field: FieldPath, direction: Direction) -> Self {
        self.order_by.push((field, direction));
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    /// Wire `StructuredQuery` body
    pub fn to_json(&self) -> FirestoreResult<Json> {
        let mut query = Map::new();
        query.insert(
            "from".to_string(),
            json!([{ "collectionId": self.collection_id }]),
        );

        if let Some(filter) = conjunction(&self.filters)? {
            query.insert("where".to_string(), filter);
        }

        if !self.order_by.is_empty() {
            let orders: Vec<Json> = self
                .order_by
                .iter()
                .map(|(field, direction)| {
                    json!({
                        "field": { "fieldPath": field.canonical() },
                        "direction": direction.wire_name(),
                    })
                })
                .collect();
            query.insert("orderBy".to_string(), Json::Array(orders));
        }

        if let Some(limit) = self.limit {
            query.insert("limit".to_string(), json!(limit));
        }

        Ok(Json::Object(query))
    }
}

/// A query bound to a client
#[derive(Clone)]
pub struct Query {
    firestore: Firestore,
    collection: CollectionPath,
    structured: StructuredQuery,
}

impl Query {
    pub(crate) fn new(firestore: Firestore, collection: CollectionPath) -> Self {
        let structured = StructuredQuery::new(collection.id());
        Self {
            firestore,
            collection,
            structured,
        }
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn structured(&self) -> &StructuredQuery {
        &self.structured
    }

    /// Add a `field op value` filter; filters are ANDed
    pub fn where_field(
        mut self,
        field: &str,
        op: FilterOperator,
        value: impl Into<Value>,
    ) -> FirestoreResult<Self> {
        self.structured = self.structured.filter(FieldFilter::new(field, op, value)?);
        Ok(self)
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> FirestoreResult<Self> {
        self.structured = self.structured.order(FieldPath::parse(field)?, direction);
        Ok(self)
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.structured = self.structured.with_limit(limit);
        self
    }

    /// Run the query outside any transaction
    pub async fn get(&self) -> FirestoreResult<QuerySnapshot> {
        self.execute(None).await
    }

    pub(crate) fn firestore(&self) -> &Firestore {
        &self.firestore
    }

    pub(crate) async fn execute(
        &self,
        transaction: Option<&TransactionId>,
    ) -> FirestoreResult<QuerySnapshot> {
        let body = self.structured.to_json()?;
        let items = self
            .firestore
            .rpc()
            .run_query(&self.collection.query_parent(), body, transaction)
            .await?;

        let read_time = parse_time(items.iter().find_map(|i| i.read_time.as_deref()))?;
        let docs = items
            .iter()
            .filter_map(|item| {
                item.document
                    .as_ref()
                    .map(|doc| DocumentSnapshot::from_body(doc, item.read_time.as_deref()))
            })
            .collect::<FirestoreResult<Vec<_>>>()?;

        tracing::debug!(collection = %self.collection, results = docs.len(), "query");
        Ok(QuerySnapshot::new(docs, read_time))
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("collection", &self.collection)
            .field("structured", &self.structured)
            .finish()
    }
}
