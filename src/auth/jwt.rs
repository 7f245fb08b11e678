//! # JWT Assertions
//!
//! Signed service-account assertions exchanged for OAuth access tokens.
//! Assertions are short lived and carry no secret material.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};

/// OAuth scope granting document database access
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// JWT claims for a service-account assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Issuer (service account email)
    pub iss: String,

    /// Space separated OAuth scopes
    pub scope: String,

    /// Audience (token endpoint)
    pub aud: String,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,
}

/// Assertion configuration
#[derive(Debug, Clone)]
pub struct AssertionConfig {
    /// Service account email
    pub client_email: String,

    /// Token endpoint the assertion is addressed to
    pub token_uri: String,

    /// Key id placed in the JWT header
    pub key_id: Option<String>,

    /// Assertion lifetime (the token endpoint caps this at one hour)
    pub ttl: Duration,

    pub scope: String,
}

/// Signs assertions with a service account's RSA key
#[derive(Clone)]
pub struct AssertionSigner {
    config: AssertionConfig,
    encoding_key: EncodingKey,
}

impl AssertionSigner {
    /// Create a signer from a PEM encoded RSA private key
    pub fn new(config: AssertionConfig, private_key_pem: &str) -> AuthResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|_| AuthError::InvalidPrivateKey)?;

        Ok(Self {
            config,
            encoding_key,
        })
    }

    pub fn config(&self) -> &AssertionConfig {
        &self.config
    }

    /// Build the claims for an assertion issued at `now`
    pub fn claims_at(&self, now: DateTime<Utc>) -> AssertionClaims {
        AssertionClaims {
            iss: self.config.client_email.clone(),
            scope: self.config.scope.clone(),
            aud: self.config.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + self.config.ttl).timestamp(),
        }
    }

    /// Sign an assertion issued at `now`
    pub fn sign(&self, now: DateTime<Utc>) -> AuthResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.config.key_id.clone();

        encode(&header, &self.claims_at(now), &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }
}

impl std::fmt::Debug for AssertionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionSigner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
