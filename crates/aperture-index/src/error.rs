//! Transport error types

use std::time::Duration;

use thiserror::Error;

/// Result type for index transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Index transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network request failed
    #[error("Index request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Request timeout
    #[error("Index request timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid base URL or path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Engine answered with an error status
    #[error("Index returned HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body was not the expected JSON
    #[error("Malformed index response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Retry limit exceeded
    #[error("Retry limit exceeded after {attempts} attempts: {last_error}")]
    RetryLimitExceeded { attempts: u32, last_error: String },

    /// Client build error
    #[error("Failed to build index client: {0}")]
    BuildError(String),
}

impl TransportError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::RequestFailed(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            TransportError::Timeout(_) => true,
            TransportError::HttpStatus { status, .. } => {
                // 5xx and 429 are transient on a search cluster
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retry_classification() {
        let overloaded = TransportError::HttpStatus {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "es_rejected_execution_exception".to_string(),
        };
        let bad_query = TransportError::HttpStatus {
            status: reqwest::StatusCode::BAD_REQUEST,
            body: "parsing_exception".to_string(),
        };
        assert!(overloaded.is_retryable());
        assert!(!bad_query.is_retryable());
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_retryable());
    }

    #[test]
    fn test_decode_error_is_final() {
        let error: TransportError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(!error.is_retryable());
        assert!(error.to_string().starts_with("Malformed index response"));
    }
}
