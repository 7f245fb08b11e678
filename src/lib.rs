//! firerest - A Firestore REST client with optimistic multi-document transactions
//!
//! Documents are addressed through `Firestore::doc` / `Firestore::collection`
//! and read or written directly, or inside `Firestore::run_transaction`,
//! which buffers writes, commits them atomically and retries on contention.

pub mod auth;
pub mod client;
pub mod errors;
pub mod path;
pub mod query;
pub mod reference;
pub mod rest;
pub mod transaction;
pub mod transport;
pub mod value;

pub use auth::{ServiceAccountKey, StaticTokenProvider, TokenProvider};
pub use client::{ClientConfig, Firestore};
pub use errors::{CancelReason, FirestoreError, FirestoreResult};
pub use path::{CollectionPath, DatabaseId, DocumentPath, FieldPath};
pub use query::{Direction, FilterOperator, Query};
pub use reference::{
    CollectionReference, DocumentReference, DocumentSnapshot, Precondition, QuerySnapshot,
};
pub use transaction::{BackoffConfig, CancelSignal, Transaction, TransactionOptions};
pub use transport::{HttpRequest, HttpResponse, Transport};
pub use value::{fields, FieldValue, Fields, GeoPoint, Timestamp, Value};
