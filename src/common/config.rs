//! Environment-based Configuration
//!
//! Every setting has a default, so an empty environment yields a working
//! devnet setup with the mock backend as default.
//!
//! # Environment Variables
//!
//! ## Network
//! - `PRIVACY_NETWORK` - "mainnet", "testnet", "devnet" or "localnet" (default: "devnet")
//!
//! ## Registry
//! - `PRIVACY_DEFAULT_BACKEND` - default backend name (default: "mock" on devnet/localnet,
//!   "tee-encryption" otherwise)
//! - `PRIVACY_BACKEND_PRIORITY` - comma-separated selection order
//! - `PRIVACY_PROBE_TIMEOUT_MS` - availability probe timeout per backend (default: 5000)
//!
//! ## Transfers
//! - `PRIVACY_EVENT_BUFFER` - event channel capacity (default: 64, at least 3)
//! - `PRIVACY_ENFORCE_QUOTE_EXPIRY` - "1" or "0" (default: "1")
//! - `PRIVACY_PHASE_DELAY_MS` - simulated delay per transfer phase (default: 500)
//!
//! ## Backends
//! - `PRIVACY_MOCK_LATENCY_MS` - mock latency (default: 1000)
//! - `PRIVACY_MOCK_FAILURE_RATE` - mock failure probability in [0, 1] (default: 0.0)
//! - `PRIVACY_MPC_ROUNDS` - MPC rounds per transfer, at least 1 (default: 3)
//!
//! ## Optional Settings
//! - `PRIVACY_LOG_LEVEL` - Logging level (debug, info, warn, error)

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::{MOCK_BACKEND, TEE_BACKEND};
use crate::backend::events::DEFAULT_EVENT_BUFFER;
use crate::registry::selection::DEFAULT_PRIORITY;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("mock backend not allowed on {0}")]
    MockNotAllowed(String),
}

/// Network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "mainnet-beta" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "devnet" | "dev" => Ok(Network::Devnet),
            "localnet" | "local" | "localhost" => Ok(Network::Localnet),
            _ => Err(ConfigError::InvalidValue(
                "PRIVACY_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Localnet => "localnet",
        }
    }

    /// Check if the mock backend may be registered on this network
    pub fn allows_mock(&self) -> bool {
        !matches!(self, Network::Mainnet)
    }

    /// Explorer `cluster` query parameter (`None` on mainnet)
    pub fn explorer_cluster(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => None,
            Network::Testnet => Some("testnet"),
            Network::Devnet => Some("devnet"),
            Network::Localnet => Some("custom"),
        }
    }

    /// Explorer link for a transaction
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        match self.explorer_cluster() {
            Some(cluster) => format!("https://explorer.solana.com/tx/{}?cluster={}", tx_hash, cluster),
            None => format!("https://explorer.solana.com/tx/{}", tx_hash),
        }
    }

    fn default_backend(&self) -> &'static str {
        match self {
            Network::Devnet | Network::Localnet => MOCK_BACKEND,
            Network::Mainnet | Network::Testnet => TEE_BACKEND,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct PrivacyConfig {
    /// Network environment
    pub network: Network,

    /// Backend returned by `get_default()`
    pub default_backend: String,

    /// Selection order for `get_best_backend`
    pub backend_priority: Vec<String>,

    /// Per-backend availability probe timeout
    pub probe_timeout: Duration,

    /// Event channel capacity
    pub event_buffer: usize,

    /// Reject transfers carrying an expired quote
    pub enforce_quote_expiry: bool,

    /// Simulated delay per transfer phase
    pub phase_delay: Duration,

    /// Mock backend latency in milliseconds
    pub mock_latency_ms: u64,

    /// Mock backend failure probability
    pub mock_failure_rate: f64,

    /// MPC rounds per transfer
    pub mpc_rounds: u32,

    /// Log level
    pub log_level: String,
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        let network = Network::Devnet;
        Self {
            network,
            default_backend: network.default_backend().to_string(),
            backend_priority: DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect(),
            probe_timeout: Duration::from_millis(5_000),
            event_buffer: DEFAULT_EVENT_BUFFER,
            enforce_quote_expiry: true,
            phase_delay: Duration::from_millis(500),
            mock_latency_ms: 1_000,
            mock_failure_rate: 0.0,
            mpc_rounds: 3,
            log_level: "info".to_string(),
        }
    }
}

impl PrivacyConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let network: Network = lookup("PRIVACY_NETWORK")
            .unwrap_or_else(|| "devnet".to_string())
            .parse()?;

        let default_backend = lookup("PRIVACY_DEFAULT_BACKEND")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| network.default_backend().to_string());

        let backend_priority = match lookup("PRIVACY_BACKEND_PRIORITY") {
            Some(raw) => {
                let names: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if names.is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "PRIVACY_BACKEND_PRIORITY".to_string(),
                        "must list at least one backend".to_string(),
                    ));
                }
                names
            }
            None => defaults.backend_priority,
        };

        let probe_timeout_ms: u64 = parse_or(&lookup, "PRIVACY_PROBE_TIMEOUT_MS", 5_000)?;
        if probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "PRIVACY_PROBE_TIMEOUT_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let event_buffer: usize = parse_or(&lookup, "PRIVACY_EVENT_BUFFER", DEFAULT_EVENT_BUFFER)?;
        if event_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "PRIVACY_EVENT_BUFFER".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let enforce_quote_expiry = match lookup("PRIVACY_ENFORCE_QUOTE_EXPIRY") {
            Some(v) => parse_flag("PRIVACY_ENFORCE_QUOTE_EXPIRY", &v)?,
            None => true,
        };

        let phase_delay_ms: u64 = parse_or(&lookup, "PRIVACY_PHASE_DELAY_MS", 500)?;
        let mock_latency_ms: u64 = parse_or(&lookup, "PRIVACY_MOCK_LATENCY_MS", 1_000)?;

        let mock_failure_rate: f64 = parse_or(&lookup, "PRIVACY_MOCK_FAILURE_RATE", 0.0)?;
        if !(0.0..=1.0).contains(&mock_failure_rate) {
            return Err(ConfigError::InvalidValue(
                "PRIVACY_MOCK_FAILURE_RATE".to_string(),
                format!("{} is outside [0, 1]", mock_failure_rate),
            ));
        }

        let mpc_rounds: u32 = parse_or(&lookup, "PRIVACY_MPC_ROUNDS", 3)?;
        if mpc_rounds == 0 {
            return Err(ConfigError::InvalidValue(
                "PRIVACY_MPC_ROUNDS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let log_level = lookup("PRIVACY_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let config = Self {
            network,
            default_backend,
            backend_priority,
            probe_timeout: Duration::from_millis(probe_timeout_ms),
            event_buffer,
            enforce_quote_expiry,
            phase_delay: Duration::from_millis(phase_delay_ms),
            mock_latency_ms,
            mock_failure_rate,
            mpc_rounds,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that are unsafe for the configured network
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.network.allows_mock() && self.default_backend == MOCK_BACKEND {
            return Err(ConfigError::MockNotAllowed(self.network.to_string()));
        }
        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("=== Privacy Backend Configuration ===");
        println!("Network: {}", self.network);
        println!("Default Backend: {}", self.default_backend);
        println!("Priority: {}", self.backend_priority.join(", "));
        println!("Probe Timeout: {} ms", self.probe_timeout.as_millis());
        println!("Event Buffer: {}", self.event_buffer);
        println!("Enforce Quote Expiry: {}", self.enforce_quote_expiry);
        println!("Phase Delay: {} ms", self.phase_delay.as_millis());
        if self.network.allows_mock() {
            println!(
                "Mock: {} ms latency, {:.2} failure rate",
                self.mock_latency_ms, self.mock_failure_rate
            );
        }
        println!("MPC Rounds: {}", self.mpc_rounds);
        println!("Log Level: {}", self.log_level);
        println!("=====================================");
    }
}

/// Parse an optional variable, falling back to `default` when unset
fn parse_or<F, T>(lookup: &F, var_name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var_name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(var_name.to_string(), format!("cannot parse '{}'", raw))
        }),
        None => Ok(default),
    }
}

fn parse_flag(var_name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            var_name.to_string(),
            format!("expected 1 or 0, got '{}'", other),
        )),
    }
}
