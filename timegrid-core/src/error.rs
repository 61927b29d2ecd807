//! Error types for the timegrid engine.

use thiserror::Error;

/// Errors that can occur in timegrid operations.
#[derive(Error, Debug)]
pub enum TimeGridError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event source error: {0}")]
    Source(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for timegrid operations.
pub type TimeGridResult<T> = Result<T, TimeGridError>;
