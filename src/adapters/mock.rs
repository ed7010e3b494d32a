//! Mock Backend
//!
//! Deterministic test double implementing the full contract, including all
//! optional capabilities. Latency and failure probability are configurable;
//! failures always come back as structured results.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use super::{DEFAULT_PAYMENT_LOG_CAPACITY, MOCK_BACKEND};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::events::{TransferContext, TransferReporter};
use crate::backend::rng::{os_random, tx_hash, SharedRandom};
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
};

/// Mock backend configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Simulated end-to-end transfer latency
    pub latency_ms: u64,
    /// Probability in [0, 1] that a transfer fails
    pub failure_rate: f64,
    pub fee_bps: u32,
    pub quote_ttl_secs: i64,
    /// Most recent payments kept for `scan_payments`
    pub payment_log_capacity: usize,
    pub simulation: SimulationConfig,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 1_000,
            failure_rate: 0.0,
            fee_bps: 10,
            quote_ttl_secs: 60,
            payment_log_capacity: DEFAULT_PAYMENT_LOG_CAPACITY,
            simulation: SimulationConfig::default(),
        }
    }
}

impl MockConfig {
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }
}

/// Call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStats {
    pub status_calls: u64,
    pub quote_calls: u64,
    pub transfer_calls: u64,
    pub successful_transfers: u64,
    pub failed_transfers: u64,
}

#[derive(Debug, Default)]
struct MockState {
    stats: MockStats,
    /// (viewing key or recipient, payment), bounded by `payment_log_capacity`
    payments: VecDeque<(String, ScannedPayment)>,
    /// (address, token symbol) -> balance
    balances: HashMap<(String, String), Amount>,
    next_block: u64,
    status_error: Option<String>,
}

/// Mock privacy backend
pub struct MockBackend {
    config: MockConfig,
    rng: SharedRandom,
    available: AtomicBool,
    state: RwLock<MockState>,
}

impl MockBackend {
    pub fn new(config: MockConfig) -> Self {
        Self::with_rng(config, os_random())
    }

    /// Create with an explicit randomness source
    pub fn with_rng(config: MockConfig, rng: SharedRandom) -> Self {
        Self {
            config,
            rng,
            available: AtomicBool::new(true),
            state: RwLock::new(MockState {
                next_block: 1,
                ..Default::default()
            }),
        }
    }

    pub fn shared(config: MockConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Toggle what `get_status` reports
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make `get_status` return an error (`None` clears it)
    pub async fn set_status_error(&self, error: Option<String>) {
        self.state.write().await.status_error = error;
    }

    pub async fn set_balance(&self, address: &str, token: &TokenInfo, amount: Amount) {
        self.state
            .write()
            .await
            .balances
            .insert((address.to_string(), token.symbol.clone()), amount);
    }

    pub async fn stats(&self) -> MockStats {
        self.state.read().await.stats.clone()
    }

    /// Clear counters, payments, balances and injected faults
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = MockState {
            next_block: 1,
            ..Default::default()
        };
        self.available.store(true, Ordering::SeqCst);
    }

    fn build_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        validate_quote_params(MOCK_BACKEND, &self.supported_tokens(), params)?;

        let fee = fee_with_base(MOCK_BACKEND, params.amount, self.config.fee_bps, 0)?;
        let estimated_secs = self.config.latency_ms.div_ceil(1_000).max(1);

        Ok(Quote::new(
            MOCK_BACKEND,
            params.amount,
            params.amount - fee,
            fee,
            estimated_secs,
            self.config.quote_ttl_secs,
        )
        .with_metadata("feeBps", self.config.fee_bps))
    }

    async fn half_latency(&self) {
        let half = self.config.latency_ms / 2;
        if half > 0 {
            tokio::time::sleep(Duration::from_millis(half)).await;
        }
    }

    fn should_fail(&self) -> bool {
        self.config.failure_rate > 0.0 && self.rng.next_f64() < self.config.failure_rate
    }

    async fn run_transfer(
        &self,
        params: &TransferParams,
        reporter: &TransferReporter<'_>,
    ) -> BackendResult<TransferResult> {
        validate_address(MOCK_BACKEND, &params.sender)?;
        validate_address(MOCK_BACKEND, &params.recipient)?;
        validate_quote(params, MOCK_BACKEND, self.config.simulation.enforce_quote_expiry)?;
        let quote = self.build_quote(&params.quote_params())?;

        reporter.status(TransferStatus::Signing, "Awaiting signature");
        self.half_latency().await;

        if self.should_fail() {
            return Err(BackendError::SimulatedFailure {
                backend: MOCK_BACKEND.to_string(),
                phase: "submission".to_string(),
            });
        }

        let tx = tx_hash(self.rng.as_ref());
        reporter.tx_submitted(&tx, None);
        reporter.status(TransferStatus::Confirming, "Waiting for confirmation");
        self.half_latency().await;
        reporter.tx_confirmed(&tx, None);

        let note = commitment(&[
            &quote.output_amount.to_le_bytes(),
            params.recipient.as_bytes(),
            tx.as_bytes(),
        ]);
        reporter.proof(ProofKind::Commitment, &note);

        let stealth = derive_stealth_address(&params.recipient, self.rng.as_ref())?;

        {
            let mut state = self.state.write().await;
            let block = state.next_block;
            state.next_block += 1;

            let key = params
                .viewing_key
                .clone()
                .unwrap_or_else(|| params.recipient.clone());
            state.payments.push_back((
                key,
                ScannedPayment {
                    amount: quote.output_amount,
                    token: params.to_token.clone(),
                    sender: Some(params.sender.clone()),
                    stealth_address: stealth.address.clone(),
                    tx_hash: tx.clone(),
                    timestamp: chrono::Utc::now(),
                    block,
                    claimed: false,
                },
            ));
            while state.payments.len() > self.config.payment_log_capacity {
                state.payments.pop_front();
            }

            let balance = state
                .balances
                .entry((params.recipient.clone(), params.to_token.symbol.clone()))
                .or_insert(0);
            *balance = balance.saturating_add(quote.output_amount);
        }

        Ok(TransferResult::success(tx.clone())
            .with_explorer_url(self.config.simulation.explorer_url(&tx))
            .with_stealth_address(stealth.address)
            .with_commitment(note)
            .with_viewing_key(params.viewing_key.clone())
            .with_metadata("fee", quote.fee_amount.to_string())
            .with_metadata("outputAmount", quote.output_amount.to_string()))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

#[async_trait]
impl PrivacyBackend for MockBackend {
    fn name(&self) -> &str {
        MOCK_BACKEND
    }

    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            amount_hiding: true,
            recipient_hiding: true,
            viewing_keys: true,
            same_chain_only: false,
            average_latency_ms: self.config.latency_ms,
            privacy_model: PrivacyModel::Cryptographic,
        }
    }

    fn supported_tokens(&self) -> Vec<TokenInfo> {
        vec![TokenInfo::sol(), TokenInfo::usdc(), TokenInfo::usdt()]
    }

    async fn get_status(&self) -> BackendResult<BackendStatus> {
        let mut state = self.state.write().await;
        state.stats.status_calls += 1;

        if let Some(err) = &state.status_error {
            return Err(BackendError::unavailable(MOCK_BACKEND, err.clone()));
        }

        let network = self.config.simulation.network.to_string();
        if self.available.load(Ordering::SeqCst) {
            Ok(BackendStatus::available(network, self.config.latency_ms))
        } else {
            Ok(BackendStatus::unavailable(network, "mock marked unavailable"))
        }
    }

    async fn get_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        self.state.write().await.stats.quote_calls += 1;
        record_quote(MOCK_BACKEND, params, self.build_quote(params))
    }

    async fn transfer(&self, params: &TransferParams, ctx: &TransferContext) -> TransferResult {
        self.state.write().await.stats.transfer_calls += 1;

        let reporter = TransferReporter::new(MOCK_BACKEND, ctx);
        let result = reporter.drive(self.run_transfer(params, &reporter)).await;

        let mut state = self.state.write().await;
        if result.is_success() {
            state.stats.successful_transfers += 1;
        } else {
            state.stats.failed_transfers += 1;
        }
        info!(
            backend = MOCK_BACKEND,
            status = %result.status,
            correlation_id = reporter.correlation_id(),
            "mock transfer finished"
        );
        result
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
impl PaymentScanner for MockBackend {
    async fn scan_payments(
        &self,
        viewing_key: &str,
        from_block: Option<u64>,
    ) -> BackendResult<Vec<ScannedPayment>> {
        let from = from_block.unwrap_or(0);
        let state = self.state.read().await;
        Ok(state
            .payments
            .iter()
            .filter(|(key, p)| key == viewing_key && p.block >= from)
            .map(|(_, p)| p.clone())
            .collect())
    }
}

#[async_trait]
impl BalanceProvider for MockBackend {
    async fn get_balance(&self, address: &str, token: &TokenInfo) -> BackendResult<Amount> {
        let state = self.state.read().await;
        Ok(state
            .balances
            .get(&(address.to_string(), token.symbol.clone()))
            .copied()
            .unwrap_or(0))
    }
}

impl StealthAddressGenerator for MockBackend {
    fn generate_stealth_address(&self, meta_address: &str) -> BackendResult<StealthAddress> {
        derive_stealth_address(meta_address, self.rng.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::events::{check_event_sequence, drain_events, DEFAULT_EVENT_BUFFER};
    use crate::backend::rng::{MockRandomSource, SeededRandom};
    use crate::types::TransferEvent;

    const ALICE: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
    const BOB: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

    fn fast_config() -> MockConfig {
        MockConfig {
            simulation: SimulationConfig::fast(),
            ..Default::default()
        }
        .with_latency_ms(10)
    }

    fn backend() -> MockBackend {
        MockBackend::with_rng(fast_config(), Arc::new(SeededRandom::new(42)))
    }

    #[tokio::test]
    async fn test_quote_fee_and_ttl() {
        let mock = backend();
        let quote = mock
            .get_quote(&QuoteParams::new(TokenInfo::sol(), 1_000_000_000))
            .await
            .unwrap();

        assert_eq!(quote.backend, "mock");
        assert_eq!(quote.fee_amount, 1_000_000);
        assert_eq!(quote.output_amount + quote.fee_amount, quote.input_amount);
        let ttl = (quote.expires_at - quote.created_at).num_seconds();
        assert_eq!(ttl, 60);
        assert_eq!(mock.stats().await.quote_calls, 1);
    }

    #[tokio::test]
    async fn test_quote_rejects_zero() {
        let mock = backend();
        let err = mock
            .get_quote(&QuoteParams::new(TokenInfo::sol(), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidAmount { .. }));
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let mock = backend();
        let (ctx, mut rx) = TransferContext::with_events(DEFAULT_EVENT_BUFFER);
        let params = TransferParams::new(TokenInfo::sol(), 500_000_000, ALICE, BOB);

        let result = mock.transfer(&params, &ctx).await;

        assert!(result.is_success());
        let tx = result.tx_hash.clone().unwrap();
        assert_eq!(tx.len(), 64);
        assert!(tx.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(result.stealth_address.is_some());
        assert!(result.commitment.is_some());
        assert!(result.explorer_url.unwrap().contains(&tx));

        let events = drain_events(&mut rx);
        assert_eq!(check_event_sequence(&events), Ok(TransferStatus::Success));
        assert!(events
            .iter()
            .any(|e| matches!(e, TransferEvent::TxConfirmed { tx_hash, .. } if *tx_hash == tx)));

        let stats = mock.stats().await;
        assert_eq!(stats.transfer_calls, 1);
        assert_eq!(stats.successful_transfers, 1);
    }

    #[tokio::test]
    async fn test_forced_failure_is_structured() {
        let mut rng = MockRandomSource::new();
        rng.expect_next_f64().returning(|| 0.0);
        rng.expect_next_u64().returning(|| 7);

        let mock = MockBackend::with_rng(fast_config().with_failure_rate(0.5), Arc::new(rng));
        let (ctx, mut rx) = TransferContext::with_events(DEFAULT_EVENT_BUFFER);
        let params = TransferParams::new(TokenInfo::usdc(), 5_000_000, ALICE, BOB);

        let result = mock.transfer(&params, &ctx).await;

        assert_eq!(result.status, TransferStatus::Failed);
        assert!(result.error.unwrap().contains("simulated failure"));
        assert!(result.tx_hash.is_none());

        let events = drain_events(&mut rx);
        assert_eq!(check_event_sequence(&events), Ok(TransferStatus::Failed));
        assert_eq!(mock.stats().await.failed_transfers, 1);
    }

    #[tokio::test]
    async fn test_payments_scanned_by_viewing_key() {
        let mock = backend();
        let ctx = TransferContext::new();
        let params =
            TransferParams::new(TokenInfo::sol(), 100_000_000, ALICE, BOB).with_viewing_key("vk-1");

        assert!(mock.transfer(&params, &ctx).await.is_success());
        assert!(mock.transfer(&params, &ctx).await.is_success());

        let all = mock.scan_payments("vk-1", None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].amount, 100_000_000 - 100_000);
        assert_eq!(all[0].sender.as_deref(), Some(ALICE));

        let later = mock.scan_payments("vk-1", Some(2)).await.unwrap();
        assert_eq!(later.len(), 1);
        assert!(mock.scan_payments("other", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_log_keeps_most_recent() {
        let config = MockConfig {
            payment_log_capacity: 2,
            ..fast_config()
        };
        let mock = MockBackend::with_rng(config, Arc::new(SeededRandom::new(7)));
        let ctx = TransferContext::new();
        let params =
            TransferParams::new(TokenInfo::sol(), 100_000_000, ALICE, BOB).with_viewing_key("vk-1");

        for _ in 0..3 {
            assert!(mock.transfer(&params, &ctx).await.is_success());
        }

        let kept: Vec<u64> = mock
            .scan_payments("vk-1", None)
            .await
            .unwrap()
            .iter()
            .map(|p| p.block)
            .collect();
        assert_eq!(kept, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_balances_and_reset() {
        let mock = backend();
        mock.set_balance(BOB, &TokenInfo::usdc(), 42).await;
        assert_eq!(mock.get_balance(BOB, &TokenInfo::usdc()).await.unwrap(), 42);
        assert_eq!(mock.get_balance(BOB, &TokenInfo::sol()).await.unwrap(), 0);

        mock.set_available(false);
        mock.reset().await;
        assert_eq!(mock.get_balance(BOB, &TokenInfo::usdc()).await.unwrap(), 0);
        assert!(mock.is_available().await);
        assert_eq!(mock.stats().await, MockStats { status_calls: 1, ..Default::default() });
    }

    #[tokio::test]
    async fn test_status_hooks() {
        let mock = backend();
        assert!(mock.is_available().await);

        mock.set_available(false);
        let status = mock.get_status().await.unwrap();
        assert!(!status.available);
        assert!(status.error.is_some());

        mock.set_available(true);
        mock.set_status_error(Some("rpc timeout".to_string())).await;
        assert!(mock.get_status().await.is_err());
        assert!(!mock.is_available().await);
    }

    #[tokio::test]
    async fn test_capabilities_exposed() {
        let mock = backend();
        assert!(mock.payment_scanner().is_some());
        assert!(mock.balance_provider().is_some());
        let stealth = mock.stealth_generator().unwrap().generate_stealth_address(BOB).unwrap();
        assert!(!stealth.address.is_empty());
    }
}
