//! Error types for drivebox.

use thiserror::Error;

/// Common error type for drivebox.
#[derive(Error, Debug)]
pub enum DriveboxError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Uploaded content exceeds the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Google Drive (or token endpoint) error.
    #[error("drive error: {0}")]
    Drive(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DriveboxError {
    fn from(e: sqlx::Error) -> Self {
        DriveboxError::Database(e.to_string())
    }
}

/// Result type alias for drivebox operations.
pub type Result<T> = std::result::Result<T, DriveboxError>;
