//! # References
//!
//! Document and collection handles, read snapshots, and the write model
//! shared with transactions.

pub mod collection;
pub mod document;
pub mod snapshot;
pub mod write;

pub use collection::{auto_id, CollectionReference, AUTO_ID_LENGTH};
pub use document::DocumentReference;
pub use snapshot::{DocumentSnapshot, QuerySnapshot};
pub use write::{PendingWrite, Precondition, WritePolicy};
