//! Backend Adapters
//!
//! Simulated implementations of the backend contract:
//! - `mock` - deterministic test double
//! - `pool-mixing` - fixed-denomination anonymity pools
//! - `tee-encryption` - enclave-encrypted transfers
//! - `mpc-compute` - multi-round secret-shared computation

pub mod mock;
pub mod mpc;
pub mod pool_mixing;
pub mod tee;

pub const MOCK_BACKEND: &str = "mock";
pub const POOL_BACKEND: &str = "pool-mixing";
pub const TEE_BACKEND: &str = "tee-encryption";
pub const MPC_BACKEND: &str = "mpc-compute";

/// Payments kept in memory by the mock and TEE backends; the oldest go first
pub const DEFAULT_PAYMENT_LOG_CAPACITY: usize = 10_000;

pub use mock::{MockBackend, MockConfig, MockStats};
pub use mpc::{MpcBackend, MpcConfig, DEFAULT_MPC_ROUNDS};
pub use pool_mixing::{
    AssetClass, PoolMixingBackend, PoolMixingConfig, NATIVE_BASE_FEE, POOL_FEE_BPS,
    SOL_POOL_SIZES, STABLE_POOL_SIZES,
};
pub use tee::{EnclaveCipher, TeeBackend, TeeConfig};
