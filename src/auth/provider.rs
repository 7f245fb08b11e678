//! # Token Providers
//!
//! The auth collaborator the core asks for a bearer token before each RPC.
//! Providers are shared across concurrent transactions, so `token` must be
//! safe to call from many tasks at once and must not refresh more often
//! than needed.

use std::future::Future;
use std::pin::Pin;

use super::errors::AuthResult;

/// Bearer token the emulator accepts as an administrator
pub const EMULATOR_OWNER_TOKEN: &str = "owner";

/// Boxed future returned by `TokenProvider::token`
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = AuthResult<String>> + Send + 'a>>;

/// Supplies a currently valid bearer token
pub trait TokenProvider: Send + Sync {
    /// Return a valid token, refreshing transparently if the cached one
    /// has expired
    fn token(&self) -> TokenFuture<'_>;
}

/// A fixed token (tests, or tokens minted elsewhere)
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The emulator's administrator token
    pub fn emulator() -> Self {
        Self::new(EMULATOR_OWNER_TOKEN)
    }
}

impl TokenProvider for StaticTokenProvider {
    fn token(&self) -> TokenFuture<'_> {
        let token = self.token.clone();
        Box::pin(async move { Ok(token) })
    }
}
