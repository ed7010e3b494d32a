//! Simulation Helpers
//!
//! Shared pieces of the simulated adapters: phase timing, quote checks at
//! transfer time, synthetic commitments and stealth address derivation.

use sha2::{Digest, Sha256};
use std::time::Duration;
use x25519_dalek::{PublicKey, StaticSecret};

use super::error::{BackendError, BackendResult};
use super::rng::{random_array32, RandomSource};
use crate::common::config::{Network, PrivacyConfig};
use crate::common::logging::log_quote_event;
use crate::types::{
    bps_of, Amount, Quote, QuoteParams, StealthAddress, TokenInfo, TransferParams,
};

/// Timing and policy shared by the simulated backends
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub network: Network,
    /// Delay per simulated transfer phase
    pub phase_delay: Duration,
    /// Reject transfers carrying an expired quote
    pub enforce_quote_expiry: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            network: Network::Devnet,
            phase_delay: Duration::from_millis(500),
            enforce_quote_expiry: true,
        }
    }
}

impl SimulationConfig {
    /// Millisecond phases, for tests and demos
    pub fn fast() -> Self {
        Self {
            phase_delay: Duration::from_millis(1),
            ..Self::default()
        }
    }

    pub fn from_config(config: &PrivacyConfig) -> Self {
        Self {
            network: config.network,
            phase_delay: config.phase_delay,
            enforce_quote_expiry: config.enforce_quote_expiry,
        }
    }

    /// Wait out one simulated phase
    pub async fn pause(&self) {
        if !self.phase_delay.is_zero() {
            tokio::time::sleep(self.phase_delay).await;
        }
    }

    pub fn explorer_url(&self, tx_hash: &str) -> String {
        self.network.explorer_tx_url(tx_hash)
    }
}

/// Common quote request checks: non-zero amount, supported token, same-asset pair
pub fn validate_quote_params(
    backend: &str,
    supported: &[TokenInfo],
    params: &QuoteParams,
) -> BackendResult<()> {
    if params.amount == 0 {
        return Err(BackendError::invalid_amount(backend, "amount must be greater than zero"));
    }

    if !supported.iter().any(|t| t.same_asset(&params.from_token)) {
        return Err(BackendError::unsupported_token(backend, params.from_token.symbol.clone()));
    }

    if !params.from_token.same_asset(&params.to_token) {
        return Err(BackendError::UnsupportedPair {
            backend: backend.to_string(),
            from: params.from_token.symbol.clone(),
            to: params.to_token.symbol.clone(),
        });
    }

    Ok(())
}

/// Log a quote outcome and pass it through
pub fn record_quote(
    backend: &str,
    params: &QuoteParams,
    result: BackendResult<Quote>,
) -> BackendResult<Quote> {
    match &result {
        Ok(quote) => log_quote_event(
            backend,
            Some(&quote.id),
            params.amount,
            Some(quote.fee_amount),
            None,
        ),
        Err(e) => log_quote_event(backend, None, params.amount, None, Some(&e.to_string())),
    }
    result
}

/// Check a pre-fetched quote before spending anything
pub fn validate_quote(
    params: &TransferParams,
    backend: &str,
    enforce_expiry: bool,
) -> BackendResult<()> {
    let Some(quote) = &params.quote else {
        return Ok(());
    };

    if quote.backend != backend {
        return Err(BackendError::QuoteMismatch {
            quote_id: quote.id.clone(),
            issued_by: quote.backend.clone(),
            backend: backend.to_string(),
        });
    }

    if quote.input_amount != params.amount {
        return Err(BackendError::invalid_amount(
            backend,
            format!(
                "quote {} covers {} but transfer is for {}",
                quote.id, quote.input_amount, params.amount
            ),
        ));
    }

    if enforce_expiry && quote.is_expired() {
        return Err(BackendError::QuoteExpired {
            quote_id: quote.id.clone(),
            expires_at: quote.expires_at,
        });
    }

    Ok(())
}

/// `bps` basis points of `amount` plus a flat fee, as an `InvalidAmount` error
/// when the arithmetic overflows
pub fn fee_with_base(backend: &str, amount: Amount, bps: u32, base: Amount) -> BackendResult<Amount> {
    bps_of(amount, bps)
        .and_then(|fee| fee.checked_add(base))
        .ok_or_else(|| BackendError::invalid_amount(backend, format!("fee on {} overflows", amount)))
}

/// Reject blank or malformed sender/recipient strings
pub fn validate_address(backend: &str, address: &str) -> BackendResult<()> {
    let trimmed = address.trim();
    if trimmed.is_empty() || trimmed.len() != address.len() || address.len() > 128 {
        return Err(BackendError::InvalidAddress {
            backend: backend.to_string(),
            address: address.to_string(),
        });
    }
    Ok(())
}

/// Synthetic commitment: SHA-256 over the parts, hex encoded
pub fn commitment(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"privacy-commitment-v1");
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Recipient key bytes: the base58 key itself when it decodes to 32 bytes,
/// otherwise a hash of the meta-address
fn meta_key_bytes(meta_address: &str) -> [u8; 32] {
    if let Ok(decoded) = bs58::decode(meta_address).into_vec() {
        if decoded.len() == 32 {
            let mut out = [0u8; 32];
            out.copy_from_slice(&decoded);
            return out;
        }
    }
    Sha256::digest(meta_address.as_bytes()).into()
}

/// Derive a one-time address via X25519 with a fresh ephemeral key
pub fn derive_stealth_address(
    meta_address: &str,
    rng: &dyn RandomSource,
) -> BackendResult<StealthAddress> {
    if meta_address.trim().is_empty() {
        return Err(BackendError::InvalidAddress {
            backend: "stealth".to_string(),
            address: meta_address.to_string(),
        });
    }

    let ephemeral = StaticSecret::from(random_array32(rng));
    let ephemeral_public = PublicKey::from(&ephemeral);
    let recipient = PublicKey::from(meta_key_bytes(meta_address));
    let shared = ephemeral.diffie_hellman(&recipient);

    let mut hasher = Sha256::new();
    hasher.update(b"stealth-v1");
    hasher.update(shared.as_bytes());
    hasher.update(meta_address.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();

    Ok(StealthAddress {
        address: bs58::encode(digest).into_string(),
        ephemeral_public_key: hex::encode(ephemeral_public.as_bytes()),
        view_tag: digest[0],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::rng::SeededRandom;
    use crate::types::PrivacyLevel;

    fn params() -> TransferParams {
        TransferParams::new(TokenInfo::sol(), 1_000_000, "sender", "recipient")
    }

    #[test]
    fn test_fee_overflow_is_invalid_amount() {
        assert_eq!(fee_with_base("mock", 1_000_000, 30, 5_000).unwrap(), 8_000);
        assert!(matches!(
            fee_with_base("mock", Amount::MAX, 30, 0),
            Err(BackendError::InvalidAmount { .. })
        ));
        assert!(fee_with_base("mock", Amount::MAX, 1, Amount::MAX).is_err());
    }

    #[test]
    fn test_no_quote_is_fine() {
        assert!(validate_quote(&params(), "mock", true).is_ok());
    }

    #[test]
    fn test_quote_from_other_backend_rejected() {
        let p = params().with_quote(Quote::new("tee-encryption", 1_000_000, 998_000, 2_000, 1, 60));
        let err = validate_quote(&p, "mock", true).unwrap_err();
        assert!(matches!(err, BackendError::QuoteMismatch { .. }));
    }

    #[test]
    fn test_expired_quote_respects_flag() {
        let mut quote = Quote::new("mock", 1_000_000, 999_000, 1_000, 1, 60);
        quote.expires_at = chrono::Utc::now() - chrono::Duration::seconds(5);
        let p = params().with_quote(quote);

        assert!(matches!(
            validate_quote(&p, "mock", true),
            Err(BackendError::QuoteExpired { .. })
        ));
        assert!(validate_quote(&p, "mock", false).is_ok());
    }

    #[test]
    fn test_quote_amount_must_match() {
        let p = params().with_quote(Quote::new("mock", 5, 4, 1, 1, 60));
        assert!(matches!(
            validate_quote(&p, "mock", true),
            Err(BackendError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_validate_quote_params() {
        let supported = [TokenInfo::sol(), TokenInfo::usdc()];
        let ok = QuoteParams::new(TokenInfo::sol(), 10);
        assert!(validate_quote_params("mock", &supported, &ok).is_ok());

        let zero = QuoteParams::new(TokenInfo::sol(), 0);
        assert!(matches!(
            validate_quote_params("mock", &supported, &zero),
            Err(BackendError::InvalidAmount { .. })
        ));

        let usdt = QuoteParams::new(TokenInfo::usdt(), 10);
        assert!(matches!(
            validate_quote_params("mock", &supported, &usdt),
            Err(BackendError::UnsupportedToken { .. })
        ));

        let swap = QuoteParams::new(TokenInfo::sol(), 10)
            .with_to_token(TokenInfo::usdc())
            .with_privacy_level(PrivacyLevel::Transparent);
        assert!(matches!(
            validate_quote_params("mock", &supported, &swap),
            Err(BackendError::UnsupportedPair { .. })
        ));
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("mock", "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin").is_ok());
        assert!(validate_address("mock", "").is_err());
        assert!(validate_address("mock", "  padded ").is_err());
    }

    #[test]
    fn test_commitment_deterministic() {
        let a = commitment(&[b"amount", b"recipient"]);
        let b = commitment(&[b"amount", b"recipient"]);
        let c = commitment(&[b"amountrecipient"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_stealth_address_fresh_per_call() {
        let rng = SeededRandom::new(3);
        let first = derive_stealth_address("meta-address", &rng).unwrap();
        let second = derive_stealth_address("meta-address", &rng).unwrap();

        assert_ne!(first.address, second.address);
        assert_eq!(first.ephemeral_public_key.len(), 64);
        assert!(bs58::decode(&first.address).into_vec().is_ok());
        assert!(derive_stealth_address("", &rng).is_err());
    }

    #[tokio::test]
    async fn test_fast_pause() {
        let sim = SimulationConfig::fast();
        let started = std::time::Instant::now();
        sim.pause().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
