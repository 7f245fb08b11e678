//! # Auth Errors
//!
//! Error types for credential handling and token acquisition.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Credential and token errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    // ==================
    // Credential Errors
    // ==================

    /// Service account key could not be read or parsed
    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    /// Private key is not a usable RSA PEM
    #[error("Invalid private key")]
    InvalidPrivateKey,

    // ==================
    // Token Errors
    // ==================

    /// Signing the JWT assertion failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    /// Token endpoint rejected the assertion
    #[error("Token exchange failed ({status}): {message}")]
    TokenExchangeFailed { status: u16, message: String },

    /// Token endpoint replied with an unexpected body
    #[error("Malformed token response: {0}")]
    MalformedTokenResponse(String),

    /// Token endpoint could not be reached
    #[error("Token endpoint unreachable: {0}")]
    Transport(String),
}

impl AuthError {
    /// Returns the HTTP status code this error is reported under
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidKey(_) => 400,
            AuthError::InvalidPrivateKey => 400,
            AuthError::TokenExchangeFailed { status, .. } => *status,
            AuthError::TokenGenerationFailed => 500,
            AuthError::MalformedTokenResponse(_) => 502,
            AuthError::Transport(_) => 503,
        }
    }
}
