//! Error types for the patchwatch system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for patchwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the patchwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level errors (timeouts, connection failures, bad statuses)
    #[error("transport error: {0}")]
    Transport(String),

    /// Platform adapter errors
    #[error("platform error ({platform}): {message}")]
    Platform {
        /// Platform name
        platform: String,
        /// Error message
        message: String,
    },

    /// History store errors
    #[error("history error: {0}")]
    History(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a platform adapter error
    pub fn platform(platform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Platform {
            platform: platform.into(),
            message: message.into(),
        }
    }

    /// Create a history store error
    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
