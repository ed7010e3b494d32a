//! Backend Contract
//!
//! Every privacy backend implements [`PrivacyBackend`]. Optional capabilities
//! (payment scanning, balances, stealth addresses) are separate traits reached
//! through accessors that return `None` when the backend lacks them.

use async_trait::async_trait;
use tracing::debug;

use super::error::{BackendError, BackendResult};
use super::events::TransferContext;
use crate::types::{
    Amount, BackendFeatures, BackendStatus, Quote, QuoteParams, ScannedPayment, StealthAddress,
    TokenInfo, TransferParams, TransferResult,
};

/// Uniform contract for quoting and executing a private transfer
#[async_trait]
pub trait PrivacyBackend: Send + Sync {
    /// Unique backend name, used as registry key
    fn name(&self) -> &str;

    /// Capability descriptor; never changes for an instance
    fn features(&self) -> BackendFeatures;

    /// Tokens this backend can move
    fn supported_tokens(&self) -> Vec<TokenInfo>;

    fn supports_token(&self, token: &TokenInfo) -> bool {
        self.supported_tokens().iter().any(|t| t.same_asset(token))
    }

    /// Fresh health probe
    async fn get_status(&self) -> BackendResult<BackendStatus>;

    /// `get_status().available`, with an error counted as unavailable
    async fn is_available(&self) -> bool {
        match self.get_status().await {
            Ok(status) => status.available,
            Err(e) => {
                debug!(backend = self.name(), error = %e, "status probe failed");
                false
            }
        }
    }

    /// Price a transfer; fails on invalid amounts or unsupported tokens
    async fn get_quote(&self, params: &QuoteParams) -> BackendResult<Quote>;

    /// Execute a transfer, reporting progress through `ctx`
    ///
    /// Never returns an error: failures come back as a failed result, after an
    /// `error` event and a `failed` status change.
    async fn transfer(&self, params: &TransferParams, ctx: &TransferContext) -> TransferResult;

    fn payment_scanner(&self) -> Option<&dyn PaymentScanner> {
        None
    }

    fn balance_provider(&self) -> Option<&dyn BalanceProvider> {
        None
    }

    fn stealth_generator(&self) -> Option<&dyn StealthAddressGenerator> {
        None
    }
}

/// Finds payments addressed to the holder of a viewing key
#[async_trait]
pub trait PaymentScanner: Send + Sync {
    async fn scan_payments(
        &self,
        viewing_key: &str,
        from_block: Option<u64>,
    ) -> BackendResult<Vec<ScannedPayment>>;
}

/// Reads a (possibly shielded) balance
#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn get_balance(&self, address: &str, token: &TokenInfo) -> BackendResult<Amount>;
}

/// Derives one-time receiving addresses
pub trait StealthAddressGenerator: Send + Sync {
    fn generate_stealth_address(&self, meta_address: &str) -> BackendResult<StealthAddress>;
}

fn unsupported(operation: &str, backend: &str) -> BackendError {
    BackendError::UnsupportedOperation {
        operation: operation.to_string(),
        backend: backend.to_string(),
    }
}

impl dyn PrivacyBackend {
    /// Scan through the backend's scanner, or fail with `UnsupportedOperation`
    pub async fn scan_payments(
        &self,
        viewing_key: &str,
        from_block: Option<u64>,
    ) -> BackendResult<Vec<ScannedPayment>> {
        match self.payment_scanner() {
            Some(scanner) => scanner.scan_payments(viewing_key, from_block).await,
            None => Err(unsupported("scan_payments", self.name())),
        }
    }

    pub async fn get_balance(&self, address: &str, token: &TokenInfo) -> BackendResult<Amount> {
        match self.balance_provider() {
            Some(provider) => provider.get_balance(address, token).await,
            None => Err(unsupported("get_balance", self.name())),
        }
    }

    pub fn generate_stealth_address(&self, meta_address: &str) -> BackendResult<StealthAddress> {
        match self.stealth_generator() {
            Some(generator) => generator.generate_stealth_address(meta_address),
            None => Err(unsupported("generate_stealth_address", self.name())),
        }
    }
}
