//! Backend Capability Descriptors

use serde::{Deserialize, Serialize};

/// How a backend achieves privacy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyModel {
    /// Commitments and zero-knowledge proofs
    Cryptographic,
    /// Anonymity sets (fixed-denomination pools)
    Statistical,
    /// Encrypted state processed inside a TEE
    Encryption,
    /// Multi-party computation over secret-shared inputs
    Mpc,
}

impl std::fmt::Display for PrivacyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cryptographic => write!(f, "cryptographic"),
            Self::Statistical => write!(f, "statistical"),
            Self::Encryption => write!(f, "encryption"),
            Self::Mpc => write!(f, "mpc"),
        }
    }
}

/// Capability descriptor, constant for a backend's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendFeatures {
    pub amount_hiding: bool,
    pub recipient_hiding: bool,
    pub viewing_keys: bool,
    pub same_chain_only: bool,
    pub average_latency_ms: u64,
    pub privacy_model: PrivacyModel,
}

/// Predicate over [`BackendFeatures`]; `None` fields are wildcards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFilter {
    pub amount_hiding: Option<bool>,
    pub recipient_hiding: Option<bool>,
    pub viewing_keys: Option<bool>,
    pub same_chain_only: Option<bool>,
    pub privacy_model: Option<PrivacyModel>,
    /// Upper bound on `average_latency_ms`
    pub max_average_latency_ms: Option<u64>,
}

impl FeatureFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount_hiding(mut self, value: bool) -> Self {
        self.amount_hiding = Some(value);
        self
    }

    pub fn recipient_hiding(mut self, value: bool) -> Self {
        self.recipient_hiding = Some(value);
        self
    }

    pub fn viewing_keys(mut self, value: bool) -> Self {
        self.viewing_keys = Some(value);
        self
    }

    pub fn same_chain_only(mut self, value: bool) -> Self {
        self.same_chain_only = Some(value);
        self
    }

    pub fn privacy_model(mut self, model: PrivacyModel) -> Self {
        self.privacy_model = Some(model);
        self
    }

    pub fn max_average_latency_ms(mut self, ms: u64) -> Self {
        self.max_average_latency_ms = Some(ms);
        self
    }

    /// Check every specified field against the descriptor
    pub fn matches(&self, features: &BackendFeatures) -> bool {
        fn field<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
            wanted.as_ref().map_or(true, |w| w == actual)
        }

        field(&self.amount_hiding, &features.amount_hiding)
            && field(&self.recipient_hiding, &features.recipient_hiding)
            && field(&self.viewing_keys, &features.viewing_keys)
            && field(&self.same_chain_only, &features.same_chain_only)
            && field(&self.privacy_model, &features.privacy_model)
            && self
                .max_average_latency_ms
                .map_or(true, |max| features.average_latency_ms <= max)
    }
}
