//! Error types for the Nexus client.
//!
//! This module defines a unified error enum for everything that can stop a
//! command outright: configuration, I/O, serialization and backend access.
//! Backend failures inside a conversation never reach this type; the
//! controllers turn them into transcript entries instead.

use thiserror::Error;

/// Unified error type for the Nexus client.
///
/// All fallible setup functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and terminal errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RAG backend errors surfaced outside a controller
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
