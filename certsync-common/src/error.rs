//! Common error types for CertSync

use thiserror::Error;

/// Common result type for CertSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across CertSync services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Certificate number already present in the issuing center's registry
    #[error("Duplicate certificate number: {0}")]
    DuplicateCertificateNumber(String),

    /// Attempted status change that would move a certificate backwards
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
