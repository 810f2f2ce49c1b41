//! Structured error types for taskmate
//!
//! One taxonomy for the three failure classes the pipeline can hit:
//! external-capability failures (completion, summarization, embedding),
//! persistence failures, and configuration problems. Missing state
//! (no transcript yet, no summary yet) is never an error.

use thiserror::Error;

/// Primary error type for taskmate-core operations
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Provider / API Errors
    // =========================================================================
    /// Authentication/authorization errors
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit exceeded (429)
    #[error("rate limit exceeded")]
    RateLimited,

    /// Provider returned an error
    #[error("provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    /// Network/connection error
    #[error("connection failed: {0}")]
    Connection(String),

    // =========================================================================
    // Embedding Errors
    // =========================================================================
    /// Embedding model initialization or inference failed
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Blocking task panicked or was cancelled
    #[error("blocking task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Another send/save/reset is already in flight for this session
    #[error("another operation is already in flight for this session")]
    Busy,

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("missing required configuration: {key}")]
    MissingConfig { key: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    // =========================================================================
    // Prompt Errors
    // =========================================================================
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

impl Error {
    /// Check if the error is transient. Advisory only: the pipeline itself
    /// never retries, callers may.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::RateLimited => true,
            Self::Provider { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            Self::Storage(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => {
                "Authentication failed. Please check your API key.".to_string()
            }
            Self::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
            Self::Busy => "Still working on the previous request.".to_string(),
            Self::MissingConfig { key } => {
                format!("Missing configuration '{}'. Run `taskmate config` to inspect.", key)
            }
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Result type alias using the taskmate error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(Error::Connection("timeout".to_string()).is_retryable());
        assert!(Error::RateLimited.is_retryable());
        assert!(Error::Provider {
            status: 503,
            message: "overloaded".to_string()
        }
        .is_retryable());

        assert!(!Error::Unauthorized {
            message: "bad token".to_string()
        }
        .is_retryable());
        assert!(!Error::Busy.is_retryable());
        assert!(!Error::Provider {
            status: 400,
            message: "bad request".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = Error::Unauthorized {
            message: "expired".to_string(),
        };
        assert!(err.user_message().contains("API key"));

        let err = Error::MissingConfig {
            key: "endpoint.api_key".to_string(),
        };
        assert!(err.user_message().contains("endpoint.api_key"));
    }
}
