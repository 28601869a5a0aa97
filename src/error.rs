//! Error types for feed-pager
//!
//! This module defines the error hierarchy for the crate.
//! Fallible public APIs return `Result<T, Error>` where Error is defined here.
//! Fetch failures seen by the pager are summarized as [`FetchFailure`] and
//! recorded in state instead of being propagated.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for feed-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Feed Errors
    // ============================================================================
    #[error("Malformed page response: {message}")]
    MalformedResponse { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for feed-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

// ============================================================================
// Fetch Failure Summary
// ============================================================================

/// Why the last fetch did not fold into the feed.
///
/// Kept in pagination state and surfaced in the view, so a UI can show a
/// retry affordance instead of silently losing the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchFailure {
    /// Transport failure or any error without a more specific class
    Network { message: String },
    /// Server answered with a non-success status
    Status { status: u16 },
    /// The request did not complete in time
    Timeout { after_ms: u64 },
    /// The response was missing `rows` or could not be decoded
    Malformed { message: String },
}

impl FetchFailure {
    /// Short label for logs and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Status { .. } => "status",
            Self::Timeout { .. } => "timeout",
            Self::Malformed { .. } => "malformed",
        }
    }
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network { message } => write!(f, "network failure: {message}"),
            Self::Status { status } => write!(f, "server returned HTTP {status}"),
            Self::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
            Self::Malformed { message } => write!(f, "malformed response: {message}"),
        }
    }
}

impl From<&Error> for FetchFailure {
    fn from(err: &Error) -> Self {
        match err {
            Error::Timeout { timeout_ms } => Self::Timeout {
                after_ms: *timeout_ms,
            },
            Error::HttpStatus { status, .. } => Self::Status { status: *status },
            Error::MalformedResponse { message } => Self::Malformed {
                message: message.clone(),
            },
            Error::JsonParse(e) => Self::Malformed {
                message: e.to_string(),
            },
            Error::Http(e) if e.is_decode() => Self::Malformed {
                message: e.to_string(),
            },
            Error::Http(e) if e.is_timeout() => Self::Timeout { after_ms: 0 },
            other => Self::Network {
                message: other.to_string(),
            },
        }
    }
}

impl From<Error> for FetchFailure {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_field("base_url");
        assert_eq!(err.to_string(), "Missing required config field: base_url");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::malformed("missing `rows`");
        assert_eq!(err.to_string(), "Malformed page response: missing `rows`");
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_retryable());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::malformed("x").is_retryable());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::missing_field("base_url"));
        let with_context = result.context("outer");
        assert_eq!(
            with_context.unwrap_err().to_string(),
            "outer: Missing required config field: base_url"
        );

        let lazy: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::Other, "denied"));
        let err = lazy.with_context(|| format!("reading {}", "feed.yaml")).unwrap_err();
        assert_eq!(err.to_string(), "reading feed.yaml: IO error: denied");
    }

    #[test]
    fn test_fetch_failure_classification() {
        assert_eq!(
            FetchFailure::from(Error::Timeout { timeout_ms: 250 }),
            FetchFailure::Timeout { after_ms: 250 }
        );
        assert_eq!(
            FetchFailure::from(Error::http_status(502, "bad gateway")),
            FetchFailure::Status { status: 502 }
        );
        assert_eq!(
            FetchFailure::from(Error::malformed("missing `rows`")).label(),
            "malformed"
        );
        assert_eq!(
            FetchFailure::from(Error::Other("boom".into())),
            FetchFailure::Network {
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_fetch_failure_serializes_tagged() {
        let json = serde_json::to_value(FetchFailure::Status { status: 500 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "status", "status": 500}));
    }
}
