//! # Transport Errors
//!
//! Failures below the HTTP status level. A response with an error status is
//! not a transport error; the RPC layer classifies those.

use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Network-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, DNS or TLS failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not complete within the client timeout
    #[error("Request timed out")]
    Timeout,

    /// Server replied with a body that could not be read
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Server replied with a 5xx status
    #[error("Server unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },
}

impl TransportError {
    /// Whether a transport-level retry policy may resend the request
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Network(_) | TransportError::Timeout | TransportError::Unavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Timeout.is_transient());
        assert!(TransportError::Unavailable {
            status: 503,
            message: "down".to_string()
        }
        .is_transient());
        assert!(!TransportError::InvalidResponse("x".to_string()).is_transient());
    }
}
