//! Stealth Payment Types
//!
//! Records produced by viewing-key scanning and stealth address derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::TokenInfo;
use super::units::{serde_amount, Amount};

/// A payment discovered with a viewing key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedPayment {
    #[serde(with = "serde_amount")]
    pub amount: Amount,
    pub token: TokenInfo,
    pub sender: Option<String>,
    pub stealth_address: String,
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
    /// Simulated block height of the payment
    pub block: u64,
    pub claimed: bool,
}

/// One-time destination derived from a recipient's meta-address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StealthAddress {
    /// Base58 address
    pub address: String,
    /// Hex-encoded ephemeral public key the recipient needs to recover it
    pub ephemeral_public_key: String,
    /// First byte of the shared-secret digest, for fast scanning
    pub view_tag: u8,
}
