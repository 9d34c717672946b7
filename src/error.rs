//! Error types for tap-gorgias
//!
//! A single error enum covering configuration, transport, API status and
//! paging failures. HTTP status errors carry enough information for the
//! retry layer to decide whether an attempt may be repeated.

use crate::client::retry::{RetryDecision, RetryableError};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for tap operations
pub type Result<T> = std::result::Result<T, TapError>;

#[derive(Error, Debug)]
pub enum TapError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Transport-level HTTP errors (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Singer message/catalog/state errors
    #[error("Singer error: {0}")]
    Singer(#[from] singer::Error),

    /// HTTP 429, with the server's Retry-after in seconds (0 when absent)
    #[error("{message}")]
    RateLimited { retry_after: u64, message: String },

    /// HTTP 4xx other than 429
    #[error("{message}")]
    Client { status: u16, message: String },

    /// HTTP 5xx
    #[error("{message}")]
    Server { status: u16, message: String },

    /// Any other non-success status (1xx, 3xx)
    #[error("{message}")]
    UnexpectedStatus { status: u16, message: String },

    /// Unexpected response shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Paging could not make progress
    #[error("Pagination error: {0}")]
    Pagination(String),

    /// Unknown stream name
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    /// A path placeholder had no value in the stream context
    #[error("Missing context value for path {0}")]
    MissingContext(String),
}

impl TapError {
    /// HTTP status code for API status errors
    pub fn status(&self) -> Option<u16> {
        match self {
            TapError::RateLimited { .. } => Some(429),
            TapError::Client { status, .. }
            | TapError::Server { status, .. }
            | TapError::UnexpectedStatus { status, .. } => Some(*status),
            TapError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl RetryableError for TapError {
    fn retry_decision(&self) -> RetryDecision {
        match self {
            TapError::RateLimited { retry_after, .. } if *retry_after > 0 => {
                RetryDecision::RetryAfter(Duration::from_secs(*retry_after))
            }
            TapError::RateLimited { .. } => RetryDecision::Retry,
            TapError::Server { .. } => RetryDecision::Retry,
            TapError::Http(e) if e.is_connect() || e.is_timeout() => RetryDecision::Retry,
            TapError::Http(_) => RetryDecision::NoRetry,
            TapError::Client { .. } | TapError::UnexpectedStatus { .. } => RetryDecision::NoRetry,
            TapError::Config(_)
            | TapError::Io(_)
            | TapError::Json(_)
            | TapError::Yaml(_)
            | TapError::Singer(_)
            | TapError::Parse(_)
            | TapError::Pagination(_)
            | TapError::StreamNotFound(_)
            | TapError::MissingContext(_) => RetryDecision::NoRetry,
        }
    }
}
