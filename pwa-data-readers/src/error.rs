//! Error types for data readers

use thiserror::Error;

/// Error type for data readers
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] pwa_data_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON format error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Format error
    #[error("Format error: {0}")]
    Format(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type for data readers
pub type Result<T> = std::result::Result<T, Error>;
