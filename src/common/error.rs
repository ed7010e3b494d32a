//! Common Error Types
//!
//! Root error wrapping every module error, for callers that want one type.

use thiserror::Error;

use crate::backend::BackendError;
use crate::registry::RegistryError;

/// Root error type
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Backend errors (quotes, capabilities)
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Registry errors (lookup, selection)
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal errors
    #[error("internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Backend(e) => matches!(
                e,
                BackendError::Unavailable { .. }
                    | BackendError::SimulatedFailure { .. }
                    | BackendError::QuoteExpired { .. }
            ),
            Error::Registry(RegistryError::NoBackendAvailable { .. }) => true,
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Get error code for structured output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Logging(_) => "LOGGING_ERROR",
            Error::Backend(e) => e.error_code(),
            Error::Registry(e) => e.error_code(),
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using the root Error
pub type Result<T> = std::result::Result<T, Error>;
