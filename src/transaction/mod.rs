//! # Transaction Engine
//!
//! Optimistic multi-document transactions: begin, buffered reads and
//! writes, atomic commit, and bounded retry on contention.

pub mod handle;
pub mod options;
mod runner;
pub mod state;

pub use handle::Transaction;
pub use options::{BackoffConfig, CancelSignal, TransactionOptions, DEFAULT_MAX_ATTEMPTS};
pub(crate) use runner::run;
pub use state::TransactionState;
