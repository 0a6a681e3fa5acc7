//! Error types for gifview
//!
//! One enum covering configuration, storage, upstream and I/O failures.
//! Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for gifview operations
pub type Result<T> = std::result::Result<T, GifviewError>;

/// Comprehensive error type for gifview operations
#[derive(Error, Debug)]
pub enum GifviewError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache store errors that are not plain SQLite failures
    #[error("Cache error: {0}")]
    Cache(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Content provider errors
    #[error("Provider error: {0}")]
    Provider(#[from] crate::provider::ProviderError),

    /// Background task failed to complete
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
