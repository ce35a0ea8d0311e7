//! Error types for search client operations.
//!
//! Errors here are always batch-level (or request-level). A single bulk item
//! that the engine rejected is *not* an error: it is reported as a
//! [`BulkResponseItem`](crate::BulkResponseItem) with `ok == false`.

use quarry_transport::TransportError;
use thiserror::Error;

/// Search client error type.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// Local misuse of a descriptor, detected before anything is serialized.
    #[error("DSL error: {0}")]
    Dsl(String),

    /// An index or type name could not be determined from the settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The engine's response broke the request/response correlation contract.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The engine answered with a non-success status and no usable result.
    #[error("Engine error ({status}): {reason}")]
    Engine {
        /// HTTP status code.
        status: u16,
        /// Reason reported by the engine.
        reason: String,
    },

    /// The addressed resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Index already exists.
    #[error("Index already exists: {0}")]
    IndexExists(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The round trip itself failed (timeout, connection, cancelled).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl QuarryError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::Dsl(format!("missing {}()", field))
    }

    /// Check if this error was raised locally, before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Dsl(_) | Self::Configuration(_))
    }

    /// Check if this is a descriptor misuse error.
    pub fn is_dsl(&self) -> bool {
        matches!(self, Self::Dsl(_))
    }

    /// Check if this is a protocol violation.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Check if the addressed resource was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if resending the same request could succeed.
    ///
    /// Only transport failures and 5xx engine answers qualify. Nothing in
    /// this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connection(),
            Self::Engine { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the transport timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

/// Result type alias for search client operations.
pub type Result<T> = std::result::Result<T, QuarryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_field_message() {
        let err = QuarryError::missing("Name");
        assert_eq!(err.to_string(), "DSL error: missing Name()");
        assert!(err.is_dsl());
        assert!(err.is_local());
    }

    #[test]
    fn test_transport_timeout_is_not_local() {
        let err = QuarryError::from(TransportError::Timeout(Duration::from_secs(1)));
        assert!(err.is_timeout());
        assert!(!err.is_local());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_engine_error_retryable_only_on_5xx() {
        let unavailable = QuarryError::Engine {
            status: 503,
            reason: "unavailable".to_string(),
        };
        let bad_request = QuarryError::Engine {
            status: 400,
            reason: "MapperParsingException".to_string(),
        };
        assert!(unavailable.is_retryable());
        assert!(!bad_request.is_retryable());
        assert_eq!(bad_request.to_string(), "Engine error (400): MapperParsingException");
    }
}
