//! # Path Model
//!
//! Resource paths identifying databases, collections and documents, plus
//! field paths into document data.

pub mod database;
pub mod errors;
pub mod field_path;
pub mod resource;

pub use database::{DatabaseId, DEFAULT_DATABASE};
pub use errors::{PathError, PathResult};
pub use field_path::FieldPath;
pub use resource::{CollectionPath, DocumentPath, ResourcePath};
