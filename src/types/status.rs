//! Backend Health Snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a single `get_status()` probe; never cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub available: bool,
    pub network: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_checked: DateTime<Utc>,
}

impl BackendStatus {
    pub fn available(network: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            available: true,
            network: network.into(),
            latency_ms,
            error: None,
            last_checked: Utc::now(),
        }
    }

    pub fn unavailable(network: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            available: false,
            network: network.into(),
            latency_ms: 0,
            error: Some(error.into()),
            last_checked: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let up = BackendStatus::available("devnet", 12);
        assert!(up.available);
        assert!(up.error.is_none());

        let down = BackendStatus::unavailable("devnet", "enclave offline");
        assert!(!down.available);
        assert_eq!(down.error.as_deref(), Some("enclave offline"));
    }
}
