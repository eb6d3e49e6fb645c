//! Error types for text classification and model management

use thiserror::Error;

/// Result type for NLP operations
pub type NlpResult<T> = Result<T, NlpError>;

/// Errors raised by the classification and model-cache layers
#[derive(Error, Debug)]
pub enum NlpError {
    /// The embedding provider is not available (model not loaded)
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Embedding a text failed
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// An internal classification stage failed
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Model cache directory or state file error
    #[error("Model cache error: {0}")]
    Cache(String),
}

impl From<std::io::Error> for NlpError {
    fn from(err: std::io::Error) -> Self {
        NlpError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for NlpError {
    fn from(err: serde_json::Error) -> Self {
        NlpError::Cache(err.to_string())
    }
}
