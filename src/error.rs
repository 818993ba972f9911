// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Only [`CrawlError`] ever escapes a crawl; everything that goes wrong
//! below the root is recorded on the affected node as a [`NodeFailure`].

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Instead of matching against magic strings like `"rate_limited"`,
/// the domain vocabulary is encoded in the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded, back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body carries no code
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "validation_error" => Self::ValidationFailed,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::ServiceUnavailable | Self::InternalError => true,
            Self::HttpStatus(status) => matches!(status, 0 | 429 | 500..=599),
            _ => false,
        }
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// A remote call that could not be completed.
///
/// Carries the HTTP status (0 when no response was received) and the
/// error body exactly as the remote side produced it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("remote call failed with status {status}: {}", payload_message(.payload))]
pub struct OperationError {
    pub status: u16,
    pub payload: Value,
}

impl OperationError {
    pub fn new(status: u16, payload: Value) -> Self {
        Self { status, payload }
    }

    /// A failure that happened before any response arrived.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            payload: serde_json::json!({ "message": message.into() }),
        }
    }

    /// The human-readable message from the payload, or a generic fallback.
    pub fn message(&self) -> String {
        payload_message(&self.payload)
    }

    /// The Notion error code, falling back to the HTTP status.
    pub fn code(&self) -> NotionErrorCode {
        self.payload
            .get("code")
            .and_then(Value::as_str)
            .map(NotionErrorCode::from_api_response)
            .unwrap_or(NotionErrorCode::HttpStatus(self.status))
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable() || matches!(self.status, 0 | 429 | 500..=599)
    }
}

fn payload_message(payload: &Value) -> String {
    match payload {
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| "no message".to_string()),
        Value::String(s) => s.clone(),
        Value::Null => "no message".to_string(),
        other => other.to_string(),
    }
}

/// Why one field of a node could not be filled in.
///
/// Stored as the `Err` side of a node's tagged outcomes; never propagated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeFailure {
    #[error(transparent)]
    Remote(#[from] OperationError),

    #[error("operation not found: {0}")]
    OperationNotFound(String),

    #[error("{}", crate::constants::TIMED_OUT_MESSAGE)]
    TimedOut,

    #[error("task aborted: {0}")]
    TaskAborted(String),
}

/// The failures that abort a crawl instead of degrading it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrawlError {
    #[error("Operation not found: {0}")]
    OperationNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrawlError {
    /// Machine-readable code used in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OperationNotFound(_) => "operation_not_found",
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<crate::types::ValidationError> for CrawlError {
    fn from(err: crate::types::ValidationError) -> Self {
        CrawlError::InvalidParameters(err.to_string())
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error(transparent)]
    Crawl(#[from] CrawlError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operation_error_display_uses_payload_message() {
        let err = OperationError::new(
            404,
            json!({"object": "error", "code": "object_not_found", "message": "Could not find page"}),
        );
        assert_eq!(
            err.to_string(),
            "remote call failed with status 404: Could not find page"
        );
        assert_eq!(err.code(), NotionErrorCode::ObjectNotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn operation_error_without_code_falls_back_to_status() {
        let err = OperationError::new(503, Value::Null);
        assert_eq!(err.code(), NotionErrorCode::HttpStatus(503));
        assert!(err.is_retryable());
        assert_eq!(err.message(), "no message");
    }

    #[test]
    fn transport_failures_are_retryable() {
        let err = OperationError::transport("connection reset");
        assert_eq!(err.status, 0);
        assert!(err.is_retryable());
        assert_eq!(err.message(), "connection reset");
    }

    #[test]
    fn node_failure_messages() {
        assert_eq!(NodeFailure::TimedOut.to_string(), "Operation timed out");
        assert_eq!(
            NodeFailure::OperationNotFound("retrieve-a-database".into()).to_string(),
            "operation not found: retrieve-a-database"
        );
    }

    #[test]
    fn crawl_error_codes() {
        assert_eq!(
            CrawlError::OperationNotFound("x".into()).code(),
            "operation_not_found"
        );
        assert_eq!(
            CrawlError::InvalidParameters("x".into()).code(),
            "invalid_parameters"
        );
        assert_eq!(CrawlError::Internal("x".into()).code(), "internal_error");
    }
}
