//! Transfer Types
//!
//! Request and result records for a privacy transfer:
//! pending → signing → confirming | processing → success | failed

use serde::{Deserialize, Serialize};

use super::quote::{Quote, QuoteParams};
use super::token::TokenInfo;
use super::units::{serde_amount, Amount};

/// Requested privacy level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyLevel {
    /// No hiding
    Transparent,
    /// Amount and/or recipient hidden
    Shielded,
    /// Shielded, with a viewing key for audit
    Compliant,
}

impl Default for PrivacyLevel {
    fn default() -> Self {
        Self::Shielded
    }
}

impl std::fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transparent => "transparent",
            Self::Shielded => "shielded",
            Self::Compliant => "compliant",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for PrivacyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transparent" => Ok(Self::Transparent),
            "shielded" => Ok(Self::Shielded),
            "compliant" => Ok(Self::Compliant),
            _ => Err(format!("unknown privacy level: {}", s)),
        }
    }
}

/// Status of a transfer through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Accepted, nothing signed yet
    Pending,
    /// Waiting on the sender's signature
    Signing,
    /// Submitted, waiting for confirmation
    Confirming,
    /// Backend-side work (mixing, MPC rounds, relaying)
    Processing,
    /// Terminal: completed
    Success,
    /// Terminal: failed
    Failed,
}

impl Default for TransferStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Signing => "signing",
            Self::Confirming => "confirming",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "signing" => Ok(Self::Signing),
            "confirming" => Ok(Self::Confirming),
            "processing" => Ok(Self::Processing),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("unknown status: {}", s)),
        }
    }
}

/// Transfer request
///
/// `sender` is assumed to be an authorized wallet session; signing happens
/// outside this crate. A viewing key is expected for `Compliant` transfers but
/// is not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    /// Pre-fetched quote, if any
    pub quote: Option<Quote>,
    pub from_token: TokenInfo,
    pub to_token: TokenInfo,
    #[serde(with = "serde_amount")]
    pub amount: Amount,
    pub privacy_level: PrivacyLevel,
    pub sender: String,
    pub recipient: String,
    pub viewing_key: Option<String>,
    pub slippage_bps: Option<u32>,
}

impl TransferParams {
    /// Same-token shielded transfer
    pub fn new(
        token: TokenInfo,
        amount: Amount,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            quote: None,
            from_token: token.clone(),
            to_token: token,
            amount,
            privacy_level: PrivacyLevel::default(),
            sender: sender.into(),
            recipient: recipient.into(),
            viewing_key: None,
            slippage_bps: None,
        }
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quote = Some(quote);
        self
    }

    pub fn with_to_token(mut self, token: TokenInfo) -> Self {
        self.to_token = token;
        self
    }

    pub fn with_privacy_level(mut self, level: PrivacyLevel) -> Self {
        self.privacy_level = level;
        self
    }

    pub fn with_viewing_key(mut self, key: impl Into<String>) -> Self {
        self.viewing_key = Some(key.into());
        self
    }

    pub fn with_slippage_bps(mut self, bps: u32) -> Self {
        self.slippage_bps = Some(bps);
        self
    }

    /// Quote request matching this transfer
    pub fn quote_params(&self) -> QuoteParams {
        QuoteParams {
            from_token: self.from_token.clone(),
            to_token: self.to_token.clone(),
            amount: self.amount,
            privacy_level: self.privacy_level,
        }
    }
}

/// Outcome of a transfer, created once at the terminal event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub status: TransferStatus,
    pub tx_hash: Option<String>,
    pub explorer_url: Option<String>,
    pub error: Option<String>,
    pub stealth_address: Option<String>,
    pub commitment: Option<String>,
    pub viewing_key: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl TransferResult {
    pub fn success(tx_hash: impl Into<String>) -> Self {
        Self {
            status: TransferStatus::Success,
            tx_hash: Some(tx_hash.into()),
            explorer_url: None,
            error: None,
            stealth_address: None,
            commitment: None,
            viewing_key: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: TransferStatus::Failed,
            tx_hash: None,
            explorer_url: None,
            error: Some(error.into()),
            stealth_address: None,
            commitment: None,
            viewing_key: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_explorer_url(mut self, url: impl Into<String>) -> Self {
        self.explorer_url = Some(url.into());
        self
    }

    pub fn with_stealth_address(mut self, address: impl Into<String>) -> Self {
        self.stealth_address = Some(address.into());
        self
    }

    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = Some(commitment.into());
        self
    }

    pub fn with_viewing_key(mut self, key: Option<String>) -> Self {
        self.viewing_key = key;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_strings() {
        for status in [
            TransferStatus::Pending,
            TransferStatus::Signing,
            TransferStatus::Confirming,
            TransferStatus::Processing,
            TransferStatus::Success,
            TransferStatus::Failed,
        ] {
            let parsed: TransferStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TransferStatus::Success.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(!TransferStatus::Processing.is_terminal());
        assert_eq!(TransferStatus::default(), TransferStatus::Pending);
    }

    #[test]
    fn test_params_builder_and_quote_params() {
        let params = TransferParams::new(TokenInfo::sol(), 1_000, "alice", "bob")
            .with_privacy_level(PrivacyLevel::Compliant)
            .with_viewing_key("vk")
            .with_slippage_bps(50);

        let qp = params.quote_params();
        assert_eq!(qp.amount, 1_000);
        assert_eq!(qp.privacy_level, PrivacyLevel::Compliant);
        assert_eq!(qp.from_token, TokenInfo::sol());
        assert_eq!(params.viewing_key.as_deref(), Some("vk"));
    }

    #[test]
    fn test_result_constructors() {
        let ok = TransferResult::success("abc").with_commitment("c0ffee");
        assert!(ok.is_success());
        assert_eq!(ok.tx_hash.as_deref(), Some("abc"));

        let failed = TransferResult::failed("boom");
        assert!(!failed.is_success());
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.tx_hash.is_none());
    }

    #[test]
    fn test_result_json_uses_camel_case() {
        let json = serde_json::to_value(TransferResult::success("abc")).unwrap();
        assert_eq!(json["txHash"], "abc");
        assert_eq!(json["status"], "success");
    }
}
