//! # Errors
//!
//! The crate-wide error taxonomy. Local failures (paths, codec, misuse) are
//! raised before anything is sent; server failures are classified from the
//! HTTP status and the `{error: {code, message, status}}` body.

use std::fmt;

use serde_json::Value as Json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::path::PathError;
use crate::transport::TransportError;
use crate::value::CodecError;

/// Result type for client operations
pub type FirestoreResult<T> = Result<T, FirestoreError>;

/// Why an operation was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancel signal fired
    Signal,
    /// An overall or per-attempt deadline passed
    Timeout,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Signal => write!(f, "cancelled by caller"),
            CancelReason::Timeout => write!(f, "deadline exceeded"),
        }
    }
}

/// Client errors
#[derive(Debug, Clone, Error)]
pub enum FirestoreError {
    // ==================
    // Local Errors
    // ==================
    /// Malformed resource or field path
    #[error("{0}")]
    Path(#[from] PathError),

    /// Value could not be encoded or decoded
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// API misuse, e.g. reading through a finished transaction
    #[error("Usage error: {0}")]
    Usage(String),

    // ==================
    // Collaborator Errors
    // ==================
    /// Token acquisition failed
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Network or 5xx failure below the application level
    #[error("{0}")]
    Transport(#[from] TransportError),

    // ==================
    // Application Errors
    // ==================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Update-time or existence precondition did not hold
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Server rejected the bearer token
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// The transaction's read set was invalidated by a concurrent writer
    #[error("Transaction contention: {0}")]
    Contention(String),

    /// Any other non-success response
    #[error("Server error ({status} {code}): {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },

    // ==================
    // Transaction Errors
    // ==================
    /// Contention persisted through every allowed attempt
    #[error("Transaction aborted after {attempts} attempts: {last_error}")]
    TransactionAborted { attempts: u32, last_error: String },

    #[error("Cancelled: {0}")]
    Cancelled(CancelReason),
}

impl FirestoreError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Classify a non-success response
    pub fn from_response(status: u16, body: &Json) -> Self {
        let (code, message) = error_details(body);
        let message = if message.is_empty() {
            format!("HTTP {}", status)
        } else {
            message
        };

        match (status, code.as_str()) {
            (_, "ABORTED") => Self::Contention(message),
            (_, "ALREADY_EXISTS") => Self::AlreadyExists(message),
            (409, _) => Self::Contention(message),
            (_, "NOT_FOUND") | (404, _) => Self::NotFound(message),
            (_, "FAILED_PRECONDITION") => Self::PreconditionFailed(message),
            (_, "UNAUTHENTICATED") | (401, _) => Self::Unauthenticated(message),
            (_, "PERMISSION_DENIED") | (403, _) => Self::PermissionDenied(message),
            (400, _) => Self::InvalidArgument(message),
            (429, _) | (500..=599, _) => {
                Self::Transport(TransportError::Unavailable { status, message })
            }
            _ => Self::Server {
                status,
                code,
                message,
            },
        }
    }

    /// Whether this is the contention signal the transaction runner retries
    pub fn is_contention(&self) -> bool {
        matches!(self, Self::Contention(_))
    }

    /// Get error code for logs and API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Path(_) => "INVALID_PATH",
            Self::Codec(_) => "CODEC_ERROR",
            Self::Usage(_) => "USAGE_ERROR",
            Self::Auth(_) => "AUTH_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::PreconditionFailed(_) => "FAILED_PRECONDITION",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Contention(_) => "ABORTED",
            Self::Server { .. } => "SERVER_ERROR",
            Self::TransactionAborted { .. } => "TRANSACTION_ABORTED",
            Self::Cancelled(_) => "CANCELLED",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Path(_) | Self::Codec(_) | Self::Usage(_) | Self::InvalidArgument(_) => 400,
            Self::Auth(e) => e.status_code(),
            Self::Transport(TransportError::Unavailable { status, .. }) => *status,
            Self::Transport(_) => 503,
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) | Self::Contention(_) | Self::TransactionAborted { .. } => 409,
            Self::PreconditionFailed(_) => 400,
            Self::PermissionDenied(_) => 403,
            Self::Unauthenticated(_) => 401,
            Self::Server { status, .. } => *status,
            Self::Cancelled(_) => 499,
        }
    }
}

/// Pull `(status, message)` out of an error body; streaming endpoints wrap
/// it in a one-element array
fn error_details(body: &Json) -> (String, String) {
    let body = match body {
        Json::Array(items) => items.first().unwrap_or(&Json::Null),
        other => other,
    };
    let error = body.get("error").unwrap_or(body);
    let text = |key: &str| {
        error
            .get(key)
            .and_then(Json::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let mut message = text("message");
    if message.is_empty() {
        if let Json::String(raw) = body {
            message = raw.clone();
        }
    }
    (text("status"), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(status: &str, message: &str) -> Json {
        json!({"error": {"code": 0, "status": status, "message": message}})
    }

    #[test]
    fn test_contention_mapping() {
        let err = FirestoreError::from_response(409, &body("ABORTED", "Too much contention"));
        assert!(err.is_contention());
        assert!(FirestoreError::from_response(409, &Json::Null).is_contention());
    }

    #[test]
    fn test_already_exists_is_not_contention() {
        let err = FirestoreError::from_response(409, &body("ALREADY_EXISTS", "exists"));
        assert!(matches!(err, FirestoreError::AlreadyExists(_)));
    }

    #[test]
    fn test_status_classes() {
        assert!(matches!(
            FirestoreError::from_response(404, &body("NOT_FOUND", "no doc")),
            FirestoreError::NotFound(_)
        ));
        assert!(matches!(
            FirestoreError::from_response(400, &body("FAILED_PRECONDITION", "stale")),
            FirestoreError::PreconditionFailed(_)
        ));
        assert!(matches!(
            FirestoreError::from_response(400, &body("INVALID_ARGUMENT", "bad")),
            FirestoreError::InvalidArgument(_)
        ));
        assert!(matches!(
            FirestoreError::from_response(403, &body("PERMISSION_DENIED", "no")),
            FirestoreError::PermissionDenied(_)
        ));
        assert!(matches!(
            FirestoreError::from_response(503, &body("UNAVAILABLE", "down")),
            FirestoreError::Transport(TransportError::Unavailable { status: 503, .. })
        ));
    }

    #[test]
    fn test_array_wrapped_error_body() {
        let wrapped = json!([{"error": {"status": "ABORTED", "message": "contention"}}]);
        assert!(FirestoreError::from_response(409, &wrapped).is_contention());
    }

    #[test]
    fn test_message_from_raw_body() {
        let err = FirestoreError::from_response(502, &json!("<html>bad gateway</html>"));
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FirestoreError::usage("x").code(), "USAGE_ERROR");
        assert_eq!(FirestoreError::Cancelled(CancelReason::Timeout).status_code(), 499);
        assert_eq!(
            FirestoreError::TransactionAborted {
                attempts: 5,
                last_error: "x".to_string()
            }
            .status_code(),
            409
        );
    }
}
