//! Common Infrastructure Module
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - The root error type

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{ConfigError, Network, PrivacyConfig};
pub use error::{Error, Result};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_backend_status,
    log_quote_event, log_registry_event, log_system_event, log_transfer_event, ErrorDetails,
    EventCategory, LogEvent, LogLevel, LoggingError,
};
