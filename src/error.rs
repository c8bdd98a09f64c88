//! Memguard error types

use thiserror::Error;

/// Memguard error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Memory store error
    #[error("Store error: {0}")]
    Store(String),

    /// Memory record not found
    #[error("Memory not found: {0}")]
    NotFound(String),

    /// A record with the same id already exists
    #[error("Memory already exists: {0}")]
    Conflict(String),

    /// Memory record failed validation
    #[error("Invalid memory record: {0}")]
    InvalidRecord(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for Memguard operations
pub type Result<T> = std::result::Result<T, Error>;
