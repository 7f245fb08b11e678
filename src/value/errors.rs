//! # Codec Errors
//!
//! Error types for converting between native values and the wire envelope.

use thiserror::Error;

use crate::path::PathError;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Value encode/decode errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// Envelope carries a tag this client does not understand
    #[error("Unknown value variant: {0}")]
    UnknownVariant(String),

    /// Envelope is not an object with exactly one tag
    #[error("Malformed value envelope: {0}")]
    MalformedEnvelope(String),

    /// Integer payload is not a valid signed 64-bit integer
    #[error("Invalid integer value: {0}")]
    InvalidInteger(String),

    /// Double payload is neither a number nor a recognised special value
    #[error("Invalid double value: {0}")]
    InvalidDouble(String),

    /// Timestamp payload could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Bytes payload is not valid standard base64
    #[error("Invalid base64 bytes: {0}")]
    InvalidBytes(String),

    /// Reference payload is not a document resource name
    #[error("Invalid reference: {0}")]
    InvalidReference(#[from] PathError),

    /// Geopoint payload is out of range or malformed
    #[error("Invalid geopoint: {0}")]
    InvalidGeoPoint(String),

    /// Native value cannot be represented (e.g. a top-level non-map document)
    #[error("Unsupported value: {0}")]
    Unsupported(String),

    /// Serde bridge failure
    #[error("Serialization error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_variant_message_names_tag() {
        let err = CodecError::UnknownVariant("vectorValue".to_string());
        assert!(err.to_string().contains("vectorValue"));
    }
}
