//! Pool-Mixing Backend
//!
//! Fixed-denomination pools: the transfer deposits exactly one pool size and
//! withdraws it later to the recipient, linked only by a commitment. Privacy
//! comes from the anonymity set, so the amount itself is visible.
//!
//! Quote math (integer only):
//! - pool = largest denomination <= amount
//! - fee  = 35 bps of pool (+ 6_000_000 lamports relayer base fee for SOL)
//! - output + fee == pool; anything above the pool stays with the sender

use async_trait::async_trait;
use std::sync::Arc;

use super::POOL_BACKEND;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::events::{TransferContext, TransferReporter};
use crate::backend::rng::{os_random, random_hex, tx_hash, SharedRandom};
use crate::backend::simulation::{
    commitment, derive_stealth_address, fee_with_base, record_quote, validate_address, validate_quote,
    validate_quote_params, SimulationConfig,
};
use crate::backend::traits::PrivacyBackend;
use crate::types::{
    format_base_units, Amount, BackendFeatures, BackendStatus, PrivacyModel, ProofKind,
    Quote, QuoteParams, TokenInfo, TransferParams, TransferResult, TransferStatus,
};

/// SOL pool denominations in lamports: 0.1, 1, 10, 100 SOL
pub const SOL_POOL_SIZES: [Amount; 4] = [100_000_000, 1_000_000_000, 10_000_000_000, 100_000_000_000];

/// Stable token pool denominations in 6-decimal units: 10, 100, 1k, 10k
pub const STABLE_POOL_SIZES: [Amount; 4] = [10_000_000, 100_000_000, 1_000_000_000, 10_000_000_000];

/// Pool fee in basis points
pub const POOL_FEE_BPS: u32 = 35;

/// Relayer base fee for native withdrawals, in lamports
pub const NATIVE_BASE_FEE: Amount = 6_000_000;

/// Denomination family of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    Native,
    Stable,
}

impl AssetClass {
    pub fn of(token: &TokenInfo) -> Option<Self> {
        if token.is_native() {
            Some(Self::Native)
        } else if token.is_stable() {
            Some(Self::Stable)
        } else {
            None
        }
    }

    pub fn pool_sizes(&self) -> &'static [Amount] {
        match self {
            Self::Native => &SOL_POOL_SIZES,
            Self::Stable => &STABLE_POOL_SIZES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Stable => "stable",
        }
    }
}

/// Pool-mixing configuration
#[derive(Debug, Clone)]
pub struct PoolMixingConfig {
    pub deposit_latency_ms: u64,
    pub anonymity_latency_ms: u64,
    pub withdrawal_latency_ms: u64,
    pub quote_ttl_secs: i64,
    pub simulation: SimulationConfig,
}

impl Default for PoolMixingConfig {
    fn default() -> Self {
        Self {
            deposit_latency_ms: 15_000,
            anonymity_latency_ms: 30_000,
            withdrawal_latency_ms: 15_000,
            quote_ttl_secs: 120,
            simulation: SimulationConfig::default(),
        }
    }
}

impl PoolMixingConfig {
    fn total_latency_ms(&self) -> u64 {
        self.deposit_latency_ms + self.anonymity_latency_ms + self.withdrawal_latency_ms
    }
}

/// Pool-mixing privacy backend
pub struct PoolMixingBackend {
    config: PoolMixingConfig,
    rng: SharedRandom,
}

impl PoolMixingBackend {
    pub fn new(config: PoolMixingConfig) -> Self {
        Self::with_rng(config, os_random())
    }

    pub fn with_rng(config: PoolMixingConfig, rng: SharedRandom) -> Self {
        Self { config, rng }
    }

    pub fn shared(config: PoolMixingConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    fn asset_class(&self, token: &TokenInfo) -> BackendResult<AssetClass> {
        AssetClass::of(token)
            .ok_or_else(|| BackendError::unsupported_token(POOL_BACKEND, token.symbol.clone()))
    }

    /// Largest pool that fits in `amount`
    pub fn find_best_pool_size(&self, token: &TokenInfo, amount: Amount) -> BackendResult<Amount> {
        let sizes = self.asset_class(token)?.pool_sizes();
        sizes
            .iter()
            .rev()
            .find(|&&size| size <= amount)
            .copied()
            .ok_or(BackendError::BelowMinimum {
                backend: POOL_BACKEND.to_string(),
                amount,
                minimum: sizes[0],
            })
    }

    /// Fee charged on one pool deposit
    pub fn calculate_fee(&self, token: &TokenInfo, pool_size: Amount) -> BackendResult<Amount> {
        let base = if token.is_native() { NATIVE_BASE_FEE } else { 0 };
        fee_with_base(POOL_BACKEND, pool_size, POOL_FEE_BPS, base)
    }

    fn build_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        validate_quote_params(POOL_BACKEND, &self.supported_tokens(), params)?;

        let token = &params.from_token;
        let class = self.asset_class(token)?;
        let pool_size = self.find_best_pool_size(token, params.amount)?;
        let fee = self.calculate_fee(token, pool_size)?;
        let output = pool_size.checked_sub(fee).ok_or(BackendError::BelowMinimum {
            backend: POOL_BACKEND.to_string(),
            amount: params.amount,
            minimum: fee,
        })?;
        let remainder = params.amount - pool_size;

        let mut quote = Quote::new(
            POOL_BACKEND,
            params.amount,
            output,
            fee,
            self.config.total_latency_ms() / 1_000,
            self.config.quote_ttl_secs,
        )
        .with_metadata("poolSize", pool_size.to_string())
        .with_metadata("remainder", remainder.to_string())
        .with_metadata("assetClass", class.as_str());

        if remainder > 0 {
            quote = quote.with_warning(format!(
                "Only the {} pool ({} {}) is mixed; {} base units ({} {}) remain with the sender",
                pool_size,
                format_base_units(pool_size, token.decimals),
                token.symbol,
                remainder,
                format_base_units(remainder, token.decimals),
                token.symbol,
            ));
        }

        Ok(quote)
    }

    async fn run_transfer(
        &self,
        params: &TransferParams,
        reporter: &TransferReporter<'_>,
    ) -> BackendResult<TransferResult> {
        validate_address(POOL_BACKEND, &params.sender)?;
        validate_address(POOL_BACKEND, &params.recipient)?;
        validate_quote(params, POOL_BACKEND, self.config.simulation.enforce_quote_expiry)?;
        let quote = self.build_quote(&params.quote_params())?;
        let pool_size = self.find_best_pool_size(&params.from_token, params.amount)?;
        let sim = &self.config.simulation;

        // Deposit
        reporter.status(
            TransferStatus::Signing,
            &format!("Sign deposit into the {} pool", pool_size),
        );
        sim.pause().await;
        let deposit_tx = tx_hash(self.rng.as_ref());
        reporter.tx_submitted(&deposit_tx, Some("deposit"));
        reporter.status(TransferStatus::Confirming, "Confirming deposit");
        sim.pause().await;
        reporter.tx_confirmed(&deposit_tx, Some("deposit"));

        let secret = random_hex(self.rng.as_ref(), 32);
        let note = commitment(&[
            &pool_size.to_le_bytes(),
            secret.as_bytes(),
            deposit_tx.as_bytes(),
        ]);
        reporter.proof(ProofKind::Commitment, &note);

        // Anonymity set
        let anonymity_set_size = 50 + self.rng.next_u64() % 450;
        reporter.status(
            TransferStatus::Processing,
            &format!("Mixing with {} deposits", anonymity_set_size),
        );
        sim.pause().await;
        let proof = random_hex(self.rng.as_ref(), 64);
        reporter.proof(ProofKind::ZkProof, &proof);

        // Withdrawal
        reporter.status(TransferStatus::Processing, "Relaying withdrawal");
        let withdrawal_tx = tx_hash(self.rng.as_ref());
        reporter.tx_submitted(&withdrawal_tx, Some("withdrawal"));
        sim.pause().await;
        reporter.tx_confirmed(&withdrawal_tx, Some("withdrawal"));

        let stealth = derive_stealth_address(&params.recipient, self.rng.as_ref())?;

        Ok(TransferResult::success(withdrawal_tx.clone())
            .with_explorer_url(sim.explorer_url(&withdrawal_tx))
            .with_stealth_address(stealth.address)
            .with_commitment(note)
            .with_metadata("depositTx", deposit_tx)
            .with_metadata("withdrawalTx", withdrawal_tx)
            .with_metadata("poolSize", pool_size.to_string())
            .with_metadata("fee", quote.fee_amount.to_string())
            .with_metadata("anonymitySetSize", anonymity_set_size))
    }
}

impl Default for PoolMixingBackend {
    fn default() -> Self {
        Self::new(PoolMixingConfig::default())
    }
}

#[async_trait]
impl PrivacyBackend for PoolMixingBackend {
    fn name(&self) -> &str {
        POOL_BACKEND
    }

    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            amount_hiding: false,
            recipient_hiding: true,
            viewing_keys: false,
            same_chain_only: true,
            average_latency_ms: self.config.total_latency_ms(),
            privacy_model: PrivacyModel::Statistical,
        }
    }

    fn supported_tokens(&self) -> Vec<TokenInfo> {
        vec![TokenInfo::sol(), TokenInfo::usdc(), TokenInfo::usdt()]
    }

    async fn get_status(&self) -> BackendResult<BackendStatus> {
        Ok(BackendStatus::available(
            self.config.simulation.network.to_string(),
            self.config.simulation.phase_delay.as_millis() as u64,
        ))
    }

    async fn get_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        record_quote(POOL_BACKEND, params, self.build_quote(params))
    }

    async fn transfer(&self, params: &TransferParams, ctx: &TransferContext) -> TransferResult {
        let reporter = TransferReporter::new(POOL_BACKEND, ctx);
        reporter.drive(self.run_transfer(params, &reporter)).await
    }
}
