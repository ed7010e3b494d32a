//! MPC-Compute Backend
//!
//! The amount is secret-shared and processed over a fixed number of
//! sequential computation rounds. The recipient stays public.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::MPC_BACKEND;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::events::{TransferContext, TransferReporter};
use crate::backend::rng::{os_random, random_hex, tx_hash, SharedRandom};
use crate::backend::simulation::{
    commitment, fee_with_base, record_quote, validate_address, validate_quote, validate_quote_params,
    SimulationConfig,
};
use crate::backend::traits::PrivacyBackend;
use crate::types::{
    Amount, BackendFeatures, BackendStatus, PrivacyModel, ProofKind, Quote, QuoteParams,
    TokenInfo, TransferParams, TransferResult, TransferStatus, DEFAULT_QUOTE_TTL_SECS,
};

pub const DEFAULT_MPC_ROUNDS: u32 = 3;

/// Computation fee per round for native transfers, in lamports
pub const ROUND_FEE_LAMPORTS: Amount = 5_000;

/// MPC backend configuration
#[derive(Debug, Clone)]
pub struct MpcConfig {
    pub rounds: u32,
    pub round_latency_ms: u64,
    pub submission_latency_ms: u64,
    pub confirmation_latency_ms: u64,
    pub fee_bps: u32,
    pub min_amount: Amount,
    pub quote_ttl_secs: i64,
    pub simulation: SimulationConfig,
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_MPC_ROUNDS,
            round_latency_ms: 1_500,
            submission_latency_ms: 500,
            confirmation_latency_ms: 1_000,
            fee_bps: 25,
            min_amount: 10_000,
            quote_ttl_secs: DEFAULT_QUOTE_TTL_SECS,
            simulation: SimulationConfig::default(),
        }
    }
}

impl MpcConfig {
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    /// Latency grows with each round
    fn total_latency_ms(&self) -> u64 {
        self.submission_latency_ms
            + self.round_latency_ms * self.rounds as u64
            + self.confirmation_latency_ms
    }
}

/// MPC privacy backend
pub struct MpcBackend {
    config: MpcConfig,
    rng: SharedRandom,
}

impl MpcBackend {
    pub fn new(config: MpcConfig) -> Self {
        Self::with_rng(config, os_random())
    }

    pub fn with_rng(config: MpcConfig, rng: SharedRandom) -> Self {
        let config = MpcConfig {
            rounds: config.rounds.max(1),
            ..config
        };
        Self { config, rng }
    }

    pub fn shared(config: MpcConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn rounds(&self) -> u32 {
        self.config.rounds
    }

    /// Percentage fee plus per-round computation fee (native only)
    pub fn calculate_fee(&self, token: &TokenInfo, amount: Amount) -> BackendResult<Amount> {
        let round_fee = if token.is_native() {
            ROUND_FEE_LAMPORTS * self.config.rounds as Amount
        } else {
            0
        };
        fee_with_base(MPC_BACKEND, amount, self.config.fee_bps, round_fee)
    }

    fn build_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        validate_quote_params(MPC_BACKEND, &self.supported_tokens(), params)?;

        let fee = self.calculate_fee(&params.from_token, params.amount)?;
        let minimum = self.config.min_amount.max(fee.saturating_add(1));
        if params.amount < minimum {
            return Err(BackendError::BelowMinimum {
                backend: MPC_BACKEND.to_string(),
                amount: params.amount,
                minimum,
            });
        }

        Ok(Quote::new(
            MPC_BACKEND,
            params.amount,
            params.amount - fee,
            fee,
            self.config.total_latency_ms().div_ceil(1_000),
            self.config.quote_ttl_secs,
        )
        .with_metadata("rounds", self.config.rounds))
    }

    async fn run_transfer(
        &self,
        params: &TransferParams,
        reporter: &TransferReporter<'_>,
    ) -> BackendResult<TransferResult> {
        validate_address(MPC_BACKEND, &params.sender)?;
        validate_address(MPC_BACKEND, &params.recipient)?;
        validate_quote(params, MPC_BACKEND, self.config.simulation.enforce_quote_expiry)?;
        let quote = self.build_quote(&params.quote_params())?;
        let sim = &self.config.simulation;
        let total = self.config.rounds;

        reporter.status(TransferStatus::Signing, "Sign secret-shared inputs");
        sim.pause().await;
        let computation_tx = tx_hash(self.rng.as_ref());
        reporter.tx_submitted(&computation_tx, Some("computation"));

        let blinding = random_hex(self.rng.as_ref(), 32);
        let note = commitment(&[&quote.output_amount.to_le_bytes(), blinding.as_bytes()]);

        let started = std::time::Instant::now();
        for round in 1..=total {
            reporter.processing_round(&format!("MPC round {} of {}", round, total), round, total);
            sim.pause().await;
        }
        let compute_time: Duration = started.elapsed();

        let output = commitment(&[note.as_bytes(), computation_tx.as_bytes()]);
        reporter.proof(ProofKind::MpcResult, &output);

        reporter.status(TransferStatus::Confirming, "Confirming computation result");
        sim.pause().await;
        reporter.tx_confirmed(&computation_tx, Some("computation"));

        Ok(TransferResult::success(computation_tx.clone())
            .with_explorer_url(sim.explorer_url(&computation_tx))
            .with_commitment(note)
            .with_metadata("recipient", params.recipient.clone())
            .with_metadata("rounds", total)
            .with_metadata("computeMs", compute_time.as_millis() as u64)
            .with_metadata("mpcResult", output)
            .with_metadata("fee", quote.fee_amount.to_string()))
    }
}

impl Default for MpcBackend {
    fn default() -> Self {
        Self::new(MpcConfig::default())
    }
}

#[async_trait]
impl PrivacyBackend for MpcBackend {
    fn name(&self) -> &str {
        MPC_BACKEND
    }

    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            amount_hiding: true,
            recipient_hiding: false,
            viewing_keys: false,
            same_chain_only: true,
            average_latency_ms: self.config.total_latency_ms(),
            privacy_model: PrivacyModel::Mpc,
        }
    }

    fn supported_tokens(&self) -> Vec<TokenInfo> {
        vec![TokenInfo::sol(), TokenInfo::usdc()]
    }

    async fn get_status(&self) -> BackendResult<BackendStatus> {
        Ok(BackendStatus::available(
            self.config.simulation.network.to_string(),
            self.config.submission_latency_ms,
        ))
    }

    async fn get_quote(&self, params: &QuoteParams) -> BackendResult<Quote> {
        record_quote(MPC_BACKEND, params, self.build_quote(params))
    }

    async fn transfer(&self, params: &TransferParams, ctx: &TransferContext) -> TransferResult {
        let reporter = TransferReporter::new(MPC_BACKEND, ctx);
        reporter.drive(self.run_transfer(params, &reporter)).await
    }
}
