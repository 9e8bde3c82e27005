//! Unified error type for Nestling infrastructure operations.

use nestling_types::ConfigError;
use thiserror::Error;

/// Error type for store, config and wiring failures.
///
/// Analysis failures use [`nestling_types::AnalysisError`] instead; those are
/// part of the domain and never escape the orchestrator raw.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Secure store is unavailable or rejected the operation.
    #[error("Store error: {0}")]
    Store(String),

    /// A required component was not provided.
    #[error("Missing component: {0}")]
    MissingComponent(&'static str),
}

/// Result type alias for Nestling infrastructure operations.
pub type AppResult<T> = Result<T, AppError>;
