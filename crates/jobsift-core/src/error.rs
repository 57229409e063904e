//! Core error types for jobsift.

use thiserror::Error;

/// Errors raised by the core types and configuration.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Validation errors (invalid site origin, empty search terms)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
