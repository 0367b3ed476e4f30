//! Error types for the memory assistant

use thiserror::Error;

/// Result type alias using the memory assistant's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the memory assistant
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied data violates a precondition
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The embedding model or provider could not produce a vector
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The vector index could not be reached or failed the request
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Embedder and index disagree on vector dimensionality
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was initialized with
        expected: usize,
        /// Dimension of the offending vector
        actual: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unauthorized access
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Unauthorized(_))
    }

    /// Check if error comes from an unreachable collaborator
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Error::EmbeddingUnavailable(_) | Error::IndexUnavailable(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::IndexUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::EmbeddingUnavailable(err.to_string())
    }
}
