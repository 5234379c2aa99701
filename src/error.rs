//! Error types for the issue tracker facade
//!
//! Covers the failure modes of both provider adapters plus configuration and
//! request validation. Uses thiserror for ergonomic error handling.

use crate::integrations::{Operation, Provider};
use thiserror::Error;

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Error type for tracker operations
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Missing or invalid configuration (e.g. no token for a provider)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an unusable request
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Upstream call failed at the network level or returned a non-success status
    #[error("{provider} {operation} failed for {target}: {message}")]
    Upstream {
        provider: Provider,
        operation: Operation,
        target: String,
        /// HTTP status, `None` when the request never got a response
        status: Option<u16>,
        message: String,
    },

    /// Upstream answered successfully but the body lacked an expected field
    #[error("{provider} {operation} for {target} returned a malformed response: {detail}")]
    MalformedResponse {
        provider: Provider,
        operation: Operation,
        target: String,
        detail: String,
    },

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TrackerError {
    pub(crate) fn upstream(
        provider: Provider,
        operation: Operation,
        target: &str,
        status: Option<reqwest::StatusCode>,
        message: impl Into<String>,
    ) -> Self {
        TrackerError::Upstream {
            provider,
            operation,
            target: target.to_string(),
            status: status.map(|s| s.as_u16()),
            message: message.into(),
        }
    }

    pub(crate) fn malformed(
        provider: Provider,
        operation: Operation,
        target: &str,
        detail: impl Into<String>,
    ) -> Self {
        TrackerError::MalformedResponse {
            provider,
            operation,
            target: target.to_string(),
            detail: detail.into(),
        }
    }

    /// Upstream HTTP status carried by this error, if any
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            TrackerError::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the error was caused by the caller rather than upstream or config
    pub fn is_client_error(&self) -> bool {
        matches!(self, TrackerError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_display_includes_context() {
        let err = TrackerError::Upstream {
            provider: Provider::GitHub,
            operation: Operation::Update,
            target: "octo/repo#7".to_string(),
            status: Some(404),
            message: "HTTP 404 Not Found".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("GitHub"));
        assert!(msg.contains("update"));
        assert!(msg.contains("octo/repo#7"));
        assert_eq!(err.upstream_status(), Some(404));
    }

    #[test]
    fn test_malformed_response_display() {
        let err = TrackerError::MalformedResponse {
            provider: Provider::GitLab,
            operation: Operation::List,
            target: "42".to_string(),
            detail: "missing field `iid`".to_string(),
        };

        assert!(err.to_string().contains("missing field `iid`"));
        assert_eq!(err.upstream_status(), None);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_validation_is_client_error() {
        assert!(TrackerError::Validation("title must not be empty".into()).is_client_error());
        assert!(!TrackerError::Config("no token".into()).is_client_error());
    }
}
