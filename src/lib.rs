//! Privacy Backends - Transfer Orchestration Layer
//!
//! One contract for quoting and executing private transfers across several
//! privacy technologies, plus a registry that tracks which backends are
//! installed and which one to use.
//!
//! ## Backends
//!
//! 1. **mock** - Deterministic test double with configurable latency and failures
//! 2. **pool-mixing** - Fixed-denomination deposit/withdraw pools (statistical privacy)
//! 3. **tee-encryption** - Enclave-encrypted transfers (hides amounts)
//! 4. **mpc-compute** - Multi-round secret-shared computation
//!
//! ## Transfers
//!
//! A transfer reports progress as an ordered stream of events that starts with
//! `pending` and ends with exactly one of `success` or `failed`. Callers
//! receive the stream through a bounded channel attached to a
//! [`TransferContext`], which also carries the cancellation token.

pub mod adapters;
pub mod backend;
pub mod common;
pub mod registry;
pub mod types;

// Re-exports: backend contract
pub use backend::{
    check_event_sequence, drain_events, BackendError, BackendResult, BalanceProvider, EventSink,
    PaymentScanner, PrivacyBackend, SimulationConfig, StealthAddressGenerator, TransferContext,
    TransferReporter,
};

// Re-exports: adapters
pub use adapters::{
    MockBackend, MockConfig, MpcBackend, MpcConfig, PoolMixingBackend, PoolMixingConfig,
    TeeBackend, TeeConfig, MOCK_BACKEND, MPC_BACKEND, POOL_BACKEND, TEE_BACKEND,
};

// Re-exports: registry and selection
pub use registry::{
    create_default_registry, get_backend_by_features, get_best_backend, BackendRegistry,
    BackendSelector, ProbeOutcome, RegistryError, SharedBackend,
};

// Re-exports: configuration and errors
pub use common::{Error, Network, PrivacyConfig, Result};

// Re-exports: data model
pub use types::{
    BackendFeatures, BackendStatus, FeatureFilter, PrivacyLevel, PrivacyModel, ProofKind, Quote,
    QuoteParams, ScannedPayment, StealthAddress, TokenInfo, TransferEvent, TransferParams,
    TransferResult, TransferStatus,
};
