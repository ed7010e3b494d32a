//! Randomness Source
//!
//! Backends draw every simulated hash, key and failure roll through
//! [`RandomSource`] so tests can pin them with a seed or a mock.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Arc, Mutex};

/// Source of randomness shared by a backend
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send + Sync {
    /// Uniform 64-bit value
    fn next_u64(&self) -> u64;

    /// Uniform value in [0, 1)
    fn next_f64(&self) -> f64;
}

pub type SharedRandom = Arc<dyn RandomSource>;

/// Thread-local RNG seeded from OS entropy
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_u64(&self) -> u64 {
        rand::thread_rng().gen()
    }

    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen()
    }
}

/// Deterministic RNG for tests and reproducible demos
#[derive(Debug)]
pub struct SeededRandom {
    inner: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock still holds a usable RNG
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl RandomSource for SeededRandom {
    fn next_u64(&self) -> u64 {
        self.with_rng(|rng| rng.gen())
    }

    fn next_f64(&self) -> f64 {
        self.with_rng(|rng| rng.gen())
    }
}

/// Shared OS-backed source
pub fn os_random() -> SharedRandom {
    Arc::new(OsRandom)
}

/// Fill `len` bytes from the source
pub fn random_bytes(rng: &dyn RandomSource, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len + 8);
    while out.len() < len {
        out.extend_from_slice(&rng.next_u64().to_le_bytes());
    }
    out.truncate(len);
    out
}

/// 32 random bytes as a fixed array
pub fn random_array32(rng: &dyn RandomSource) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&random_bytes(rng, 32));
    out
}

/// Hex string of `len` random bytes
pub fn random_hex(rng: &dyn RandomSource, len: usize) -> String {
    hex::encode(random_bytes(rng, len))
}

/// Simulated transaction hash: 64 lowercase hex characters
pub fn tx_hash(rng: &dyn RandomSource) -> String {
    random_hex(rng, 32)
}
