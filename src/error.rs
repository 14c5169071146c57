//! Error types for newsgate
//!
//! This module provides error handling for the gateway and the background jobs:
//! - Domain-specific error types (upstream calls, feeds, storage, config)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for newsgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for newsgate
///
/// Upstream failures carry the name of the collaborator that failed so they can be
/// logged with the correlation id, while the HTTP mapping collapses them into a
/// single generic failure for the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "rss")
        key: Option<String>,
    },

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Upstream service could not be reached (connection error or timeout)
    #[error("{service} unreachable: {reason}")]
    UpstreamUnreachable {
        /// Upstream service name (e.g., "news", "comments", "censorship")
        service: &'static str,
        /// Underlying transport error
        reason: String,
    },

    /// Upstream service answered with a non-success status
    #[error("{service} returned HTTP {status}")]
    UpstreamRejected {
        /// Upstream service name
        service: &'static str,
        /// HTTP status code returned by the service
        status: u16,
    },

    /// Upstream response body could not be decoded
    #[error("failed to decode {service} response: {reason}")]
    Decode {
        /// Upstream service name
        service: &'static str,
        /// Decoder error message
        reason: String,
    },

    /// Comment was refused by the censorship service
    #[error("comment rejected by censorship (HTTP {status})")]
    CommentRejected {
        /// Status returned by the censorship service
        status: u16,
    },

    /// Missing or malformed client input; no upstream call was made
    #[error("validation error: {0}")]
    Validation(String),

    /// Feed could not be fetched
    #[error("feed fetch failed for {url}: {reason}")]
    FeedFetch {
        /// Feed URL
        url: String,
        /// What went wrong
        reason: String,
    },

    /// Feed content could not be parsed as RSS or Atom
    #[error("feed parse failed for {url}: {reason}")]
    FeedParse {
        /// Feed URL
        url: String,
        /// Parser error message
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Row could not be decoded into a record
    #[error("failed to decode row: {0}")]
    DecodeFailed(String),

    /// Record not found
    #[error("record not found: {0}")]
    NotFound(String),

    /// Constraint violation (e.g., duplicate link)
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "comment_rejected",
///     "message": "comment rejected by censorship (HTTP 400)"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl Error {
    /// Whether this error is one of the upstream failure kinds
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamUnreachable { .. } | Error::UpstreamRejected { .. } | Error::Decode { .. }
        )
    }
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input or refused content)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,
            Error::CommentRejected { .. } => 400,

            // 404 Not Found
            Error::Database(DatabaseError::NotFound(_)) => 404,

            // 409 Conflict
            Error::Database(DatabaseError::ConstraintViolation(_)) => 409,

            // 500 - upstream failures are not disambiguated to the caller
            Error::UpstreamUnreachable { .. } => 500,
            Error::UpstreamRejected { .. } => 500,
            Error::Decode { .. } => 500,

            // 502 Bad Gateway - external feed errors
            Error::FeedFetch { .. } => 502,
            Error::FeedParse { .. } => 502,

            // 500 Internal Server Error - Server-side issues
            Error::Database(_) => 500,
            Error::Sqlx(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::CommentRejected { .. } => "comment_rejected",
            Error::Database(DatabaseError::NotFound(_)) => "not_found",
            Error::Database(DatabaseError::ConstraintViolation(_)) => "conflict",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::UpstreamUnreachable { .. } | Error::UpstreamRejected { .. } | Error::Decode { .. } => {
                "internal_error"
            }
            Error::FeedFetch { .. } => "feed_fetch_error",
            Error::FeedParse { .. } => "feed_parse_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();

        // Upstream causes stay in the logs; the caller only sees a generic failure
        let message = if error.is_upstream() {
            "internal server error".to_string()
        } else {
            error.to_string()
        };

        let details = match &error {
            Error::CommentRejected { status } => Some(serde_json::json!({
                "censorship_status": status,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
