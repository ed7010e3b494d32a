//! Backend Error Types

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::Amount;

/// Errors raised by a privacy backend
///
/// Returned directly from `get_quote` and capability calls. During `transfer`
/// these never escape: they are folded into a failed `TransferResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{backend}: amount {amount} is below the minimum of {minimum}")]
    BelowMinimum {
        backend: String,
        amount: Amount,
        minimum: Amount,
    },

    #[error("{backend}: invalid amount: {reason}")]
    InvalidAmount { backend: String, reason: String },

    #[error("{backend}: unsupported token {token}")]
    UnsupportedToken { backend: String, token: String },

    #[error("{backend}: cannot convert {from} to {to}")]
    UnsupportedPair {
        backend: String,
        from: String,
        to: String,
    },

    #[error("{backend}: invalid address '{address}'")]
    InvalidAddress { backend: String, address: String },

    #[error("quote {quote_id} expired at {expires_at}")]
    QuoteExpired {
        quote_id: String,
        expires_at: DateTime<Utc>,
    },

    #[error("quote {quote_id} was issued by {issued_by}, not {backend}")]
    QuoteMismatch {
        quote_id: String,
        issued_by: String,
        backend: String,
    },

    #[error("{backend} unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("{backend}: simulated failure ({phase})")]
    SimulatedFailure { backend: String, phase: String },

    #[error("transfer cancelled")]
    Cancelled,

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("{operation} is not supported by {backend}")]
    UnsupportedOperation { operation: String, backend: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl BackendError {
    pub fn invalid_amount(backend: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            backend: backend.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unsupported_token(backend: &str, token: impl Into<String>) -> Self {
        Self::UnsupportedToken {
            backend: backend.to_string(),
            token: token.into(),
        }
    }

    pub fn unavailable(backend: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.to_string(),
            reason: reason.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Caller-side problem (bad input, stale quote) rather than a backend fault
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BackendError::BelowMinimum { .. }
                | BackendError::InvalidAmount { .. }
                | BackendError::UnsupportedToken { .. }
                | BackendError::UnsupportedPair { .. }
                | BackendError::InvalidAddress { .. }
                | BackendError::QuoteExpired { .. }
                | BackendError::QuoteMismatch { .. }
        )
    }

    /// Error code for structured logs and results
    pub fn error_code(&self) -> &'static str {
        match self {
            BackendError::BelowMinimum { .. } => "BELOW_MINIMUM",
            BackendError::InvalidAmount { .. } => "INVALID_AMOUNT",
            BackendError::UnsupportedToken { .. } => "UNSUPPORTED_TOKEN",
            BackendError::UnsupportedPair { .. } => "UNSUPPORTED_PAIR",
            BackendError::InvalidAddress { .. } => "INVALID_ADDRESS",
            BackendError::QuoteExpired { .. } => "QUOTE_EXPIRED",
            BackendError::QuoteMismatch { .. } => "QUOTE_MISMATCH",
            BackendError::Unavailable { .. } => "BACKEND_UNAVAILABLE",
            BackendError::SimulatedFailure { .. } => "SIMULATED_FAILURE",
            BackendError::Cancelled => "CANCELLED",
            BackendError::Encryption(_) => "ENCRYPTION_ERROR",
            BackendError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            BackendError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Result type alias using BackendError
pub type BackendResult<T> = std::result::Result<T, BackendError>;
