//! Token Reference Data

use serde::{Deserialize, Serialize};

/// USDC mint on Solana mainnet
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// USDT mint on Solana mainnet
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Immutable description of a transferable asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Ticker symbol (e.g. "SOL")
    pub symbol: String,
    /// Display name
    pub name: String,
    /// Mint / contract address; `None` for the chain's native asset
    pub mint: Option<String>,
    /// Decimal places of one whole token
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        mint: Option<String>,
        decimals: u8,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            mint,
            decimals,
        }
    }

    /// Native SOL
    pub fn sol() -> Self {
        Self::new("SOL", "Solana", None, 9)
    }

    /// USD Coin
    pub fn usdc() -> Self {
        Self::new("USDC", "USD Coin", Some(USDC_MINT.to_string()), 6)
    }

    /// Tether USD
    pub fn usdt() -> Self {
        Self::new("USDT", "Tether USD", Some(USDT_MINT.to_string()), 6)
    }

    /// True for the chain's native asset
    pub fn is_native(&self) -> bool {
        self.mint.is_none()
    }

    /// True for USD-pegged stable tokens
    pub fn is_stable(&self) -> bool {
        matches!(self.symbol.to_uppercase().as_str(), "USDC" | "USDT")
    }

    /// Same underlying asset (symbol and mint match; display name is ignored)
    pub fn same_asset(&self, other: &TokenInfo) -> bool {
        self.symbol.eq_ignore_ascii_case(&other.symbol) && self.mint == other.mint
    }

    /// Look up one of the well-known tokens by symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.to_uppercase().as_str() {
            "SOL" => Some(Self::sol()),
            "USDC" => Some(Self::usdc()),
            "USDT" => Some(Self::usdt()),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
