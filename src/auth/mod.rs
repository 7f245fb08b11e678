//! # Auth
//!
//! Bearer-token acquisition for REST calls: a `TokenProvider` trait, a
//! static provider (emulator, pre-minted tokens) and a service-account
//! provider with its own cached token.

pub mod errors;
pub mod jwt;
pub mod provider;
pub mod service_account;

pub use errors::{AuthError, AuthResult};
pub use jwt::{AssertionClaims, AssertionSigner, DATASTORE_SCOPE};
pub use provider::{StaticTokenProvider, TokenFuture, TokenProvider, EMULATOR_OWNER_TOKEN};
pub use service_account::{ServiceAccountKey, ServiceAccountTokenProvider, DEFAULT_TOKEN_URI};
