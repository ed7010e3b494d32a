//! TEE-Encryption Backend
//!
//! Amount and recipient are sealed with ChaCha20-Poly1305 under a per-backend
//! enclave key before anything is signed. One transaction per transfer, low
//! and nearly constant latency.

use async_trait::async_trait;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

use super::{DEFAULT_PAYMENT_LOG_CAPACITY, TEE_BACKEND};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::events::{TransferContext, TransferReporter};
use crate::backend::rng::{os_random, random_array32, random_bytes, tx_hash, RandomSource, SharedRandom};
use crate::backend::simulation::{
    commitment, derive_stealth_address, fee_with_base, record_quote, validate_address, validate_quote,
    validate_quote_params, SimulationConfig,
};
use crate::backend::traits::{
    BalanceProvider, PaymentScanner, PrivacyBackend, StealthAddressGenerator,
};
use crate::types::{
    Amount, BackendFeatures, BackendStatus, PrivacyModel, ProofKind, Quote, QuoteParams,
    ScannedPayment, StealthAddress, TokenInfo, TransferParams, TransferResult, TransferStatus,
    DEFAULT_QUOTE_TTL_SECS,
};

const NONCE_LEN: usize = 12;

/// Symmetric cipher standing in for the enclave's sealing key
pub struct EnclaveCipher {
    cipher: ChaCha20Poly1305,
}

impl EnclaveCipher {
    pub fn new(key: [u8; 32]) -> BackendResult<Self> {
        let cipher = ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| BackendError::Encryption(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Seal to hex(nonce || ciphertext)
    pub fn encrypt(&self, plaintext: &[u8], rng: &dyn RandomSource) -> BackendResult<String> {
        let nonce_bytes = random_bytes(rng, NONCE_LEN);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| BackendError::Encryption(e.to_string()))?;

        let mut sealed = nonce_bytes;
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    pub fn decrypt(&self, sealed_hex: &str) -> BackendResult<Vec<u8>> {
        let sealed = hex::decode(sealed_hex).map_err(|e| BackendError::Encryption(e.to_string()))?;
        if sealed.len() <= NONCE_LEN {
            return Err(BackendError::Encryption("ciphertext too short".to_string()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| BackendError::Encryption(e.to_string()))
    }
}

/// TEE backend configuration
#[derive(Debug, Clone)]
pub struct TeeConfig {
    pub fee_bps: u32,
    pub min_amount: Amount,
    pub encryption_latency_ms: u64,
    pub execution_latency_ms: u64,
    pub confirmation_latency_ms: u64,
    pub quote_ttl_secs: i64,
    /// Most recent sealed payments kept for `scan_payments`
    pub payment_log_capacity: usize,
    pub simulation: SimulationConfig,
}

impl Default for TeeConfig {
    fn default() -> Self {
        Self {
            fee_bps: 20,
            min_amount: 10_000,
            encryption_latency_ms: 200,
            execution_latency_ms: 800,
            confirmation_latency_ms: 1_000,
            quote_ttl_secs: DEFAULT_QUOTE_TTL_SECS,
            payment_log_capacity: DEFAULT_PAYMENT_LOG_CAPACITY,
            simulation: SimulationConfig::default(),
        }
    }
}

impl TeeConfig {
    fn total_latency_ms(&self) -> u64 {
        self.encryption_latency_ms + self.execution_latency_ms + self.confirmation_latency_ms
    }
}

/// Sealed record of one completed transfer
struct LedgerEntry {
    /// Viewing key, or the recipient when none was given
    owner: String,
    sealed_amount: String,
    payment: ScannedPayment,
}

/// Bounded ledger; positions keep counting after old entries are evicted
#[derive(Default)]
struct SealedLedger {
    entries: VecDeque<(u64, LedgerEntry)>,
    next_position: u64,
}

impl SealedLedger {
    fn append(&mut self, entry: LedgerEntry, capacity: usize) {
        self.entries.push_back((self.next_position, entry));
        self.next_position += 1;
        while self.entries.len() > capacity {
            self.entries.pop_front();
        }
    }
}

/// TEE-encryption privacy backend
pub struct TeeBackend {
    config: TeeConfig,
    rng: SharedRandom,
    cipher: EnclaveCipher,
    ledger: RwLock<SealedLedger>,
}

impl TeeBackend {
    pub fn new(config: TeeConfig) -> BackendResult<Self> {
        Self::with_rng(config, os_random())
    }

    pub fn with_rng(config: TeeConfig, rng: SharedRandom) -> BackendResult<Self> {
        let cipher = EnclaveCipher::new(random_array32(rng.as_ref()))?;
        Ok(Self {
            config,
            rng,
            cipher,
            ledger: RwLock::new(SealedLedger::default()),
        })
    }

    pub fn shared(config: TeeConfig) -> BackendResult<Arc<Self>> {
        Ok(Arc::new(Self::new(config)?))
    }

    pub fn calculate_fee(&self, amount: Amount) -> BackendResult<Amount> {
        fee_with_base(TEE_BACKEND, amount, self.config.fee_bps, 0)
    }

    fn build_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        validate_quote_params(TEE_BACKEND, &self.supported_tokens(), params)?;
        if params.amount < self.config.min_amount {
            return Err(BackendError::BelowMinimum {
                backend: TEE_BACKEND.to_string(),
                amount: params.amount,
                minimum: self.config.min_amount,
            });
        }

        let fee = self.calculate_fee(params.amount)?;
        Ok(Quote::new(
            TEE_BACKEND,
            params.amount,
            params.amount - fee,
            fee,
            self.config.total_latency_ms().div_ceil(1_000),
            self.config.quote_ttl_secs,
        )
        .with_metadata("feeBps", self.config.fee_bps))
    }

    async fn run_transfer(
        &self,
        params: &TransferParams,
        reporter: &TransferReporter<'_>,
    ) -> BackendResult<TransferResult> {
        validate_address(TEE_BACKEND, &params.sender)?;
        validate_address(TEE_BACKEND, &params.recipient)?;
        validate_quote(params, TEE_BACKEND, self.config.simulation.enforce_quote_expiry)?;
        let quote = self.build_quote(&params.quote_params())?;
        let sim = &self.config.simulation;

        reporter.status(TransferStatus::Signing, "Encrypting transfer inside enclave");
        let sealed_amount = self
            .cipher
            .encrypt(&quote.output_amount.to_le_bytes(), self.rng.as_ref())?;
        let sealed_recipient = self
            .cipher
            .encrypt(params.recipient.as_bytes(), self.rng.as_ref())?;
        reporter.proof(ProofKind::Encryption, &sealed_amount);
        sim.pause().await;

        let tx = tx_hash(self.rng.as_ref());
        reporter.tx_submitted(&tx, None);
        reporter.status(TransferStatus::Confirming, "Enclave executing transfer");
        sim.pause().await;
        reporter.tx_confirmed(&tx, None);

        let stealth = derive_stealth_address(&params.recipient, self.rng.as_ref())?;
        let note = commitment(&[sealed_amount.as_bytes(), sealed_recipient.as_bytes()]);

        let entry = LedgerEntry {
            owner: params
                .viewing_key
                .clone()
                .unwrap_or_else(|| params.recipient.clone()),
            sealed_amount: sealed_amount.clone(),
            payment: ScannedPayment {
                amount: 0,
                token: params.to_token.clone(),
                sender: None,
                stealth_address: stealth.address.clone(),
                tx_hash: tx.clone(),
                timestamp: chrono::Utc::now(),
                block: 0,
                claimed: false,
            },
        };
        self.ledger
            .write()
            .await
            .append(entry, self.config.payment_log_capacity);

        Ok(TransferResult::success(tx.clone())
            .with_explorer_url(sim.explorer_url(&tx))
            .with_stealth_address(stealth.address)
            .with_commitment(note)
            .with_viewing_key(params.viewing_key.clone())
            .with_metadata("encryptedAmount", sealed_amount)
            .with_metadata("encryptedRecipient", sealed_recipient)
            .with_metadata("fee", quote.fee_amount.to_string()))
    }
}

#[async_trait]
impl PrivacyBackend for TeeBackend {
    fn name(&self) -> &str {
        TEE_BACKEND
    }

    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            amount_hiding: true,
            recipient_hiding: true,
            viewing_keys: true,
            same_chain_only: true,
            average_latency_ms: self.config.total_latency_ms(),
            privacy_model: PrivacyModel::Encryption,
        }
    }

    fn supported_tokens(&self) -> Vec<TokenInfo> {
        vec![TokenInfo::sol(), TokenInfo::usdc(), TokenInfo::usdt()]
    }

    async fn get_status(&self) -> BackendResult<BackendStatus> {
        Ok(BackendStatus::available(
            self.config.simulation.network.to_string(),
            self.config.encryption_latency_ms,
        ))
    }

    async fn get_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        record_quote(TEE_BACKEND, params, self.build_quote(params))
    }

    async fn transfer(&self, params: &TransferParams, ctx: &TransferContext) -> TransferResult {
        let reporter = TransferReporter::new(TEE_BACKEND, ctx);
        reporter.drive(self.run_transfer(params, &reporter)).await
    }

    fn payment_scanner(&self) -> Option<&dyn PaymentScanner> {
        Some(self)
    }

    fn balance_provider(&self) -> Option<&dyn BalanceProvider> {
        Some(self)
    }

    fn stealth_generator(&self) -> Option<&dyn StealthAddressGenerator> {
        Some(self)
    }
}

#[async_trait]
impl PaymentScanner for TeeBackend {
    async fn scan_payments(
        &self,
        viewing_key: &str,
        from_block: Option<u64>,
    ) -> BackendResult<Vec<ScannedPayment>> {
        let ledger = self.ledger.read().await;
        let mut payments = Vec::new();

        // Ledger position stands in for block height
        let from = from_block.unwrap_or(0);
        for (position, entry) in ledger.entries.iter() {
            if *position < from || entry.owner != viewing_key {
                continue;
            }

            let plain = self.cipher.decrypt(&entry.sealed_amount)?;
            let bytes: [u8; 16] = plain
                .as_slice()
                .try_into()
                .map_err(|_| BackendError::Encryption("sealed amount has wrong length".to_string()))?;

            let mut payment = entry.payment.clone();
            payment.amount = Amount::from_le_bytes(bytes);
            payment.block = *position;
            payments.push(payment);
        }

        Ok(payments)
    }
}

#[async_trait]
impl BalanceProvider for TeeBackend {
    /// Balances live inside the enclave and are not exposed; always zero
    async fn get_balance(&self, address: &str, token: &TokenInfo) -> BackendResult<Amount> {
        warn!(
            backend = TEE_BACKEND,
            address,
            token = %token,
            "enclave balances are sealed; reporting zero"
        );
        Ok(0)
    }
}

impl StealthAddressGenerator for TeeBackend {
    fn generate_stealth_address(&self, meta_address: &str) -> BackendResult<StealthAddress> {
        derive_stealth_address(meta_address, self.rng.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::events::{check_event_sequence, drain_events, DEFAULT_EVENT_BUFFER};
    use crate::backend::rng::SeededRandom;
    use crate::types::TransferEvent;

    fn backend() -> TeeBackend {
        TeeBackend::with_rng(
            TeeConfig {
                simulation: SimulationConfig::fast(),
                ..Default::default()
            },
            Arc::new(SeededRandom::new(5)),
        )
        .unwrap()
    }

    #[test]
    fn test_cipher_roundtrip_and_tamper() {
        let rng = SeededRandom::new(1);
        let cipher = EnclaveCipher::new([9u8; 32]).unwrap();
        let sealed = cipher.encrypt(b"recipient", &rng).unwrap();
        assert_eq!(cipher.decrypt(&sealed).unwrap(), b"recipient");

        let mut tampered = hex::decode(&sealed).unwrap();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xff;
        assert!(cipher.decrypt(&hex::encode(tampered)).is_err());
        assert!(cipher.decrypt("00").is_err());
    }

    #[tokio::test]
    async fn test_quote_fee() {
        let tee = backend();
        let quote = tee
            .get_quote(&QuoteParams::new(TokenInfo::usdc(), 1_000_000))
            .await
            .unwrap();
        assert_eq!(quote.fee_amount, 2_000);
        assert_eq!(quote.output_amount, 998_000);
        assert_eq!((quote.expires_at - quote.created_at).num_seconds(), 300);
    }

    #[tokio::test]
    async fn test_quote_below_minimum() {
        let tee = backend();
        let err = tee
            .get_quote(&QuoteParams::new(TokenInfo::sol(), 9_999))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::BelowMinimum { .. }));
    }

    #[tokio::test]
    async fn test_quote_fee_overflow_rejected() {
        let tee = backend();
        let err = tee
            .get_quote(&QuoteParams::new(TokenInfo::sol(), Amount::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidAmount { .. }));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_transfer_and_scan() {
        let tee = backend();
        let (ctx, mut rx) = TransferContext::with_events(DEFAULT_EVENT_BUFFER);
        let params = TransferParams::new(TokenInfo::sol(), 1_000_000_000, "sender-wallet", "recipient-wallet")
            .with_viewing_key("audit-key");

        let result = tee.transfer(&params, &ctx).await;
        assert!(result.is_success());
        assert!(result.stealth_address.is_some());
        assert_eq!(result.viewing_key.as_deref(), Some("audit-key"));

        let events = drain_events(&mut rx);
        assert_eq!(check_event_sequence(&events), Ok(TransferStatus::Success));
        assert!(events.iter().any(|e| matches!(
            e,
            TransferEvent::ProofGenerated { kind: ProofKind::Encryption, .. }
        )));

        let payments = tee.scan_payments("audit-key", None).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 1_000_000_000 - 2_000_000);
        assert!(tee.scan_payments("someone-else", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_evicts_oldest() {
        let tee = TeeBackend::with_rng(
            TeeConfig {
                simulation: SimulationConfig::fast(),
                payment_log_capacity: 2,
                ..Default::default()
            },
            Arc::new(SeededRandom::new(9)),
        )
        .unwrap();
        let ctx = TransferContext::new();
        let params = TransferParams::new(TokenInfo::sol(), 1_000_000, "sender-wallet", "recipient-wallet")
            .with_viewing_key("audit-key");

        for _ in 0..3 {
            assert!(tee.transfer(&params, &ctx).await.is_success());
        }

        let payments = tee.scan_payments("audit-key", None).await.unwrap();
        let positions: Vec<u64> = payments.iter().map(|p| p.block).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(payments[0].amount, 1_000_000 - 2_000);
        assert_eq!(tee.scan_payments("audit-key", Some(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_balance_is_documented_noop() {
        let tee = backend();
        assert_eq!(tee.get_balance("anyone", &TokenInfo::sol()).await.unwrap(), 0);
    }
}
