//! Structured Logging
//!
//! Structured logging on top of `tracing`:
//! - JSON output on mainnet, pretty output elsewhere
//! - Correlation IDs tying a transfer's events together
//! - One helper per event family (registry, quote, transfer, status)
//!
//! # Usage
//!
//! ```rust,ignore
//! use privacy_backends::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, false)?;
//! tracing::info!(target: "privacy_backends::registry", backend = "mock", "registered");
//! ```

use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::types::{BackendStatus, TransferEvent, TransferStatus};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Backend registration and selection
    Registry,
    /// Quote negotiation
    Quote,
    /// Transfer progress
    Transfer,
    /// Backend health probes
    Status,
    /// Startup, shutdown
    System,
    /// Error events
    Error,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    /// Log level
    pub level: String,
    /// Event category
    pub category: EventCategory,
    /// Human-readable message
    pub message: String,
    /// Correlation ID for transfer tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level.as_filter().to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Add correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add error details
    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    /// Render as a JSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }

    /// Emit through `tracing` at the event's own level
    fn emit(&self, level: LogLevel, family: &'static str) {
        let line = self.to_json();
        match level {
            LogLevel::Trace => tracing::trace!(target: "privacy_backends", category = family, "{}", line),
            LogLevel::Debug => tracing::debug!(target: "privacy_backends", category = family, "{}", line),
            LogLevel::Info => tracing::info!(target: "privacy_backends", category = family, "{}", line),
            LogLevel::Warn => tracing::warn!(target: "privacy_backends", category = family, "{}", line),
            LogLevel::Error => tracing::error!(target: "privacy_backends", category = family, "{}", line),
        }
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log a startup/shutdown event, or a fatal error when `error` is set
pub fn log_system_event(message: &str, data: serde_json::Value, error: Option<&str>) {
    match error {
        Some(err) => LogEvent::new(LogLevel::Error, EventCategory::Error, message)
            .with_data(data)
            .with_error("SYSTEM_ERROR", err)
            .emit(LogLevel::Error, "system"),
        None => LogEvent::new(LogLevel::Info, EventCategory::System, message)
            .with_data(data)
            .emit(LogLevel::Info, "system"),
    }
}

/// Log a registry change (register, unregister, default change, selection)
pub fn log_registry_event(event_type: &str, backend: &str, data: Option<serde_json::Value>) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::Registry, event_type)
        .with_data(serde_json::json!({ "backend": backend, "details": data }));
    event.emit(LogLevel::Info, "registry");
}

/// Log a quote outcome
pub fn log_quote_event(
    backend: &str,
    quote_id: Option<&str>,
    amount: u128,
    fee: Option<u128>,
    error: Option<&str>,
) {
    let success = error.is_none();
    let level = if success { LogLevel::Info } else { LogLevel::Warn };
    let mut event = LogEvent::new(
        level,
        EventCategory::Quote,
        if success { "quote_issued" } else { "quote_rejected" },
    )
    .with_data(serde_json::json!({
        "backend": backend,
        "quote_id": quote_id,
        "amount": amount.to_string(),
        "fee": fee.map(|f| f.to_string()),
    }));

    if let Some(err) = error {
        event = event.with_error("QUOTE_ERROR", err);
    }

    event.emit(level, "quote");
}

/// Log one transfer event under the transfer's correlation id
pub fn log_transfer_event(backend: &str, correlation_id: &str, transfer_event: &TransferEvent) {
    let level = match transfer_event {
        TransferEvent::Error { .. } => LogLevel::Warn,
        TransferEvent::StatusChange { status, .. } => match status {
            TransferStatus::Failed => LogLevel::Warn,
            TransferStatus::Pending | TransferStatus::Success => LogLevel::Info,
            _ => LogLevel::Debug,
        },
        _ => LogLevel::Debug,
    };

    let mut event = LogEvent::new(level, EventCategory::Transfer, transfer_event.event_type())
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "backend": backend,
            "event": transfer_event,
        }));

    if let TransferEvent::Error { error, .. } = transfer_event {
        event = event.with_error("TRANSFER_ERROR", error.clone());
    }

    event.emit(level, "transfer");
}

/// Log a health probe result
pub fn log_backend_status(backend: &str, status: &BackendStatus, duration_ms: u64) {
    let level = if status.available { LogLevel::Debug } else { LogLevel::Warn };
    let mut event = LogEvent::new(level, EventCategory::Status, "backend_status")
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "backend": backend,
            "available": status.available,
            "network": status.network,
            "latency_ms": status.latency_ms,
        }));

    if let Some(err) = &status.error {
        event = event.with_error("BACKEND_UNAVAILABLE", err.clone());
    }

    event.emit(level, "status");
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("privacy_backends={}", level.as_filter())));

    if json_format {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_span_events(FmtSpan::CLOSE),
        );

        subscriber
            .try_init()
            .map_err(|e| LoggingError::InitFailed(e.to_string()))?;
    }

    Ok(())
}

/// Initialize logging from PrivacyConfig
pub fn init_from_config(config: &super::config::PrivacyConfig) -> Result<(), LoggingError> {
    let level = LogLevel::from(config.log_level.as_str());
    let json_format = config.network == super::config::Network::Mainnet;

    init_logging(level, json_format)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

// ============================================================================
// Correlation IDs
// ============================================================================

/// Generate a correlation ID for one transfer
pub fn generate_correlation_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis() as u64;
    format!("{:x}-{:08x}", millis & 0xFFFF_FFFF, rand::random::<u32>())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(LogLevel::Info, EventCategory::Transfer, "status_change")
            .with_correlation_id("abc-123")
            .with_data(serde_json::json!({"backend": "mock"}))
            .with_duration(42);

        let json = event.to_json();
        assert!(json.contains("status_change"));
        assert!(json.contains("abc-123"));
        assert!(json.contains("\"duration_ms\":42"));
        assert!(json.contains("\"category\":\"transfer\""));
    }

    #[test]
    fn test_log_event_error_details() {
        let event = LogEvent::new(LogLevel::Warn, EventCategory::Quote, "quote_rejected")
            .with_error("QUOTE_ERROR", "below minimum");
        let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(json["level"], "WARN");
        assert_eq!(json["error"]["code"], "QUOTE_ERROR");
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::from("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::from("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::from("unknown"), LogLevel::Info);
    }

    #[test]
    fn test_correlation_id_generation() {
        let id1 = generate_correlation_id();
        let id2 = generate_correlation_id();

        assert!(id1.contains('-'));
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_helpers_do_not_panic_without_subscriber() {
        log_registry_event("register", "mock", None);
        log_quote_event("mock", Some("q_1"), 1_000, Some(1), None);
        log_quote_event("mock", None, 0, None, Some("invalid amount"));
        log_transfer_event("mock", "cid", &TransferEvent::error("boom"));
        log_backend_status("mock", &BackendStatus::unavailable("devnet", "down"), 3);
    }
}
