//! Quote Types
//!
//! A quote is a time-boxed offer from one backend: input, output and fee in
//! base units, plus the backend's latency estimate. Quotes are created fresh
//! per `get_quote` call and never mutated afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::token::TokenInfo;
use super::transfer::PrivacyLevel;
use super::units::{fee_percent, serde_amount, Amount};

/// Default quote lifetime
pub const DEFAULT_QUOTE_TTL_SECS: i64 = 300;

/// Input to `get_quote`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub from_token: TokenInfo,
    pub to_token: TokenInfo,
    #[serde(with = "serde_amount")]
    pub amount: Amount,
    pub privacy_level: PrivacyLevel,
}

impl QuoteParams {
    /// Same-token quote request
    pub fn new(token: TokenInfo, amount: Amount) -> Self {
        Self {
            from_token: token.clone(),
            to_token: token,
            amount,
            privacy_level: PrivacyLevel::Shielded,
        }
    }

    pub fn with_to_token(mut self, token: TokenInfo) -> Self {
        self.to_token = token;
        self
    }

    pub fn with_privacy_level(mut self, level: PrivacyLevel) -> Self {
        self.privacy_level = level;
        self
    }
}

/// A backend's offer for a transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Unique quote ID
    pub id: String,
    /// Name of the issuing backend
    pub backend: String,
    #[serde(with = "serde_amount")]
    pub input_amount: Amount,
    #[serde(with = "serde_amount")]
    pub output_amount: Amount,
    #[serde(with = "serde_amount")]
    pub fee_amount: Amount,
    /// Display only
    pub fee_percent: f64,
    pub estimated_time_seconds: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Quote {
    /// Create a quote valid for `ttl_secs` from now
    pub fn new(
        backend: impl Into<String>,
        input_amount: Amount,
        output_amount: Amount,
        fee_amount: Amount,
        estimated_time_seconds: u64,
        ttl_secs: i64,
    ) -> Self {
        let created_at = Utc::now();
        // expires_at must stay strictly after created_at
        let expires_at = created_at + Duration::seconds(ttl_secs.max(1));

        Self {
            id: format!("q_{}", uuid::Uuid::new_v4().simple()),
            backend: backend.into(),
            input_amount,
            output_amount,
            fee_amount,
            fee_percent: fee_percent(fee_amount, input_amount),
            estimated_time_seconds,
            created_at,
            expires_at,
            is_valid: true,
            warnings: Vec::new(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Seconds until expiry (0 once expired)
    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_new() {
        let quote = Quote::new("mock", 1_000_000, 999_000, 1_000, 2, 60);
        assert!(quote.id.starts_with("q_"));
        assert!(quote.is_valid);
        assert!(!quote.is_expired());
        assert!(quote.expires_at > quote.created_at);
        assert_eq!(quote.output_amount + quote.fee_amount, quote.input_amount);
        assert!((quote.fee_percent - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_quote_ids_unique() {
        let a = Quote::new("mock", 10, 9, 1, 1, 60);
        let b = Quote::new("mock", 10, 9, 1, 1, 60);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_zero_ttl_still_after_created() {
        let quote = Quote::new("mock", 10, 9, 1, 1, 0);
        assert!(quote.expires_at > quote.created_at);
    }

    #[test]
    fn test_expired_quote() {
        let mut quote = Quote::new("mock", 10, 9, 1, 1, 60);
        quote.expires_at = Utc::now() - Duration::seconds(1);
        assert!(quote.is_expired());
        assert_eq!(quote.remaining_secs(), 0);
    }

    #[test]
    fn test_quote_json_shape() {
        let quote = Quote::new("pool-mixing", 250_000_000, 93_650_000, 6_350_000, 60, 120)
            .with_warning("remainder")
            .with_metadata("poolSize", "100000000");
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["inputAmount"], "250000000");
        assert_eq!(json["feeAmount"], "6350000");
        assert_eq!(json["warnings"][0], "remainder");
        assert_eq!(json["metadata"]["poolSize"], "100000000");

        let back: Quote = serde_json::from_value(json).unwrap();
        assert_eq!(back.output_amount, 93_650_000);
    }
}
