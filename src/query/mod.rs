//! # Query Translator
//!
//! Chained `where` clauses to the wire's structured-query form, and result
//! rows back to snapshots.

pub mod filter;
#[allow(clippy::module_inception)]
pub mod query;

pub use filter::{conjunction, FieldFilter, FilterOperator};
pub use query::{Direction, Query, StructuredQuery};
