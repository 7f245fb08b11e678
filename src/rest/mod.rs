//! # REST Protocol
//!
//! Wire payloads and the RPC calls built on them.

pub mod rpc;
pub mod wire;

pub use rpc::{BeginMode, RpcClient};
pub use wire::{
    BatchGetItem, BeginTransactionResponse, CommitResponse, DocumentBody, RunQueryItem,
    TransactionId, WriteResult,
};
