//! # Service Account Tokens
//!
//! Exchanges signed assertions for OAuth access tokens and caches them.
//!
//! The cache lives inside the provider, not in process-wide state. Refresh
//! happens under an async mutex, so concurrent callers that find the token
//! stale wait for a single exchange instead of each issuing their own.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::errors::{AuthError, AuthResult};
use super::jwt::{AssertionConfig, AssertionSigner, DATASTORE_SCOPE};
use super::provider::{TokenFuture, TokenProvider};
use crate::transport::{HttpRequest, Transport};

/// Google's OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// A service account JSON key file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(default)]
    pub project_id: Option<String>,

    pub client_email: String,

    /// PEM encoded RSA private key
    #[serde(skip_serializing)]
    pub private_key: String,

    #[serde(default)]
    pub private_key_id: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Build a key from its parts
    pub fn new(client_email: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            project_id: None,
            client_email: client_email.into(),
            private_key: normalize_pem(&private_key.into()),
            private_key_id: None,
            token_uri: default_token_uri(),
        }
    }

    /// Parse the JSON key format
    pub fn from_json_str(json: &str) -> AuthResult<Self> {
        let mut key: ServiceAccountKey =
            serde_json::from_str(json).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        key.private_key = normalize_pem(&key.private_key);
        Ok(key)
    }

    /// Read and parse a JSON key file
    pub fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AuthError::InvalidKey(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json_str(&text)
    }
}

/// Keys pasted through environment variables often carry literal `\n`
fn normalize_pem(pem: &str) -> String {
    pem.replace("\\n", "\n")
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,

    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Cached access token
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        now + skew < self.expires_at
    }
}

/// Token provider backed by a service account key
pub struct ServiceAccountTokenProvider {
    signer: AssertionSigner,
    transport: Arc<dyn Transport>,
    cache: Mutex<Option<CachedToken>>,
    refresh_skew: Duration,
}

impl ServiceAccountTokenProvider {
    /// Create a provider that exchanges tokens through `transport`
    pub fn new(key: &ServiceAccountKey, transport: Arc<dyn Transport>) -> AuthResult<Self> {
        let signer = AssertionSigner::new(
            AssertionConfig {
                client_email: key.client_email.clone(),
                token_uri: key.token_uri.clone(),
                key_id: key.private_key_id.clone(),
                ttl: Duration::minutes(60),
                scope: DATASTORE_SCOPE.to_string(),
            },
            &key.private_key,
        )?;

        Ok(Self {
            signer,
            transport,
            cache: Mutex::new(None),
            refresh_skew: Duration::seconds(60),
        })
    }

    /// Refresh this long before the reported expiry
    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }

    async fn cached_or_refresh(&self) -> AuthResult<String> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now(), self.refresh_skew) {
                return Ok(cached.access_token.clone());
            }
        }

        let fresh = self.exchange().await?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self) -> AuthResult<CachedToken> {
        let now = Utc::now();
        let assertion = self.signer.sign(now)?;
        let token_uri = self.signer.config().token_uri.clone();

        tracing::debug!(token_uri = %token_uri, "token_exchange");

        let request = HttpRequest::post(token_uri).form(vec![
            ("grant_type".to_string(), JWT_BEARER_GRANT.to_string()),
            ("assertion".to_string(), assertion),
        ]);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !response.is_success() {
            let message = response
                .body
                .get("error_description")
                .or_else(|| response.body.get("error"))
                .and_then(|v| v.as_str())
                .unwrap_or("token endpoint error")
                .to_string();
            tracing::warn!(status = response.status, message = %message, "token_exchange_failed");
            return Err(AuthError::TokenExchangeFailed {
                status: response.status,
                message,
            });
        }

        let parsed: TokenResponse = serde_json::from_value(response.body)
            .map_err(|e| AuthError::MalformedTokenResponse(e.to_string()))?;

        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: now + Duration::seconds(parsed.expires_in),
        })
    }
}

impl TokenProvider for ServiceAccountTokenProvider {
    fn token(&self) -> TokenFuture<'_> {
        Box::pin(self.cached_or_refresh())
    }
}

impl std::fmt::Debug for ServiceAccountTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenProvider")
            .field("signer", &self.signer)
            .field("refresh_skew", &self.refresh_skew)
            .finish_non_exhaustive()
    }
}
