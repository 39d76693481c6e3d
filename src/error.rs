//! Hermod error types

use std::time::Duration;

/// Hermod error types
#[derive(Debug, thiserror::Error)]
pub enum HermodError {
    // Caller errors — surfaced immediately, never metered
    #[error("authentication failed")]
    Authentication,

    #[error("invalid request: {0}")]
    Validation(String),

    // Provider/network errors — metered as failures, recovered via fallback
    #[error("deadline of {deadline:?} exceeded")]
    DeadlineExceeded { deadline: Duration },

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Non-critical persistence errors — logged and swallowed, never surfaced
    #[error("cache error: {0}")]
    Cache(String),

    #[error("metering error: {0}")]
    Metering(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HermodError {
    /// Whether this error is transient and worth retrying.
    ///
    /// Rate limits, connection-level failures, and upstream 5xx responses
    /// are transient. Caller errors, deadline expiry, and malformed
    /// responses are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            HermodError::RateLimited { .. } | HermodError::Http(_) => true,
            HermodError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HermodError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether this error class triggers the fallback policy.
    ///
    /// Authentication and validation failures indicate a malformed call,
    /// not a transient condition, and are never recovered locally.
    pub fn triggers_fallback(&self) -> bool {
        !matches!(
            self,
            HermodError::Authentication
                | HermodError::Validation(_)
                | HermodError::Configuration(_)
        )
    }
}

impl From<reqwest::Error> for HermodError {
    fn from(err: reqwest::Error) -> Self {
        HermodError::Http(err.to_string())
    }
}

/// Result type alias for Hermod operations
pub type Result<T> = std::result::Result<T, HermodError>;
