//! Error types for the Quest pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, QuestError>;

/// Main error type for the Quest pipeline
#[derive(Error, Debug)]
pub enum QuestError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
