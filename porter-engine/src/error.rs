//! Error types for the matching and assignment engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised across the engine's subsystems
#[derive(Error, Debug)]
pub enum EngineError {
    /// Store read/write failure (retryable by the queue)
    #[error("Store error: {0}")]
    Store(String),

    /// Document (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A referenced document does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// A document failed a precondition (invalid amount, missing owner, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal lifecycle transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Queue envelope or broker failure
    #[error("Queue error: {0}")]
    Queue(String),

    /// Notification endpoint failure (always swallowed after logging)
    #[error("Notification error: {0}")]
    Notification(String),

    /// Startup configuration failure
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text classification failure
    #[error("Classification error: {0}")]
    Classification(String),

    /// A job exceeded its execution timeout
    #[error("Operation timed out")]
    Timeout,
}

impl From<sled::Error> for EngineError {
    fn from(err: sled::Error) -> Self {
        EngineError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<porter_nlp::NlpError> for EngineError {
    fn from(err: porter_nlp::NlpError) -> Self {
        EngineError::Classification(err.to_string())
    }
}

impl From<sled::transaction::TransactionError<EngineError>> for EngineError {
    fn from(err: sled::transaction::TransactionError<EngineError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(storage) => {
                EngineError::Store(storage.to_string())
            }
        }
    }
}
