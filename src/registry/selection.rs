//! Backend Selection
//!
//! Picks a backend from the currently available ones, either by a priority
//! order or by required features.

use tracing::debug;

use super::backend_registry::{BackendRegistry, RegistryError, SharedBackend};
use crate::adapters::{MOCK_BACKEND, MPC_BACKEND, POOL_BACKEND, TEE_BACKEND};
use crate::common::config::PrivacyConfig;
use crate::common::logging::log_registry_event;
use crate::types::FeatureFilter;

/// Default selection order, most private first
pub const DEFAULT_PRIORITY: [&str; 4] = [TEE_BACKEND, MPC_BACKEND, POOL_BACKEND, MOCK_BACKEND];

/// Priority-ordered backend selector
///
/// Only backends named in the priority list are ever selected.
#[derive(Debug, Clone)]
pub struct BackendSelector {
    priority: Vec<String>,
}

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new(DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect())
    }
}

impl BackendSelector {
    pub fn new(priority: Vec<String>) -> Self {
        Self { priority }
    }

    pub fn from_config(config: &PrivacyConfig) -> Self {
        Self::new(config.backend_priority.clone())
    }

    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// First available backend in priority order, optionally requiring viewing keys
    pub async fn get_best_backend(
        &self,
        registry: &BackendRegistry,
        require_viewing_keys: bool,
    ) -> Result<SharedBackend, RegistryError> {
        let available = registry.get_available().await;

        for name in &self.priority {
            let Some(backend) = available.iter().find(|b| b.name() == name.as_str()) else {
                continue;
            };
            if require_viewing_keys && !backend.features().viewing_keys {
                debug!(backend = %name, "skipped: no viewing keys");
                continue;
            }

            log_registry_event(
                "backend_selected",
                name,
                Some(serde_json::json!({ "require_viewing_keys": require_viewing_keys })),
            );
            return Ok(backend.clone());
        }

        Err(RegistryError::NoBackendAvailable {
            requirement: if require_viewing_keys {
                "viewing keys required".to_string()
            } else {
                "any".to_string()
            },
        })
    }
}

/// Best backend under the registry's own priority order
///
/// `create_default_registry` sets that order from `PRIVACY_BACKEND_PRIORITY`;
/// registries built by hand use [`DEFAULT_PRIORITY`].
pub async fn get_best_backend(
    registry: &BackendRegistry,
    require_viewing_keys: bool,
) -> Result<SharedBackend, RegistryError> {
    BackendSelector::new(registry.priority().to_vec())
        .get_best_backend(registry, require_viewing_keys)
        .await
}

/// First available backend, in registration order, matching every field of `filter`
pub async fn get_backend_by_features(
    registry: &BackendRegistry,
    filter: &FeatureFilter,
) -> Result<SharedBackend, RegistryError> {
    registry
        .get_available()
        .await
        .into_iter()
        .find(|b| filter.matches(&b.features()))
        .ok_or_else(|| RegistryError::NoBackendAvailable {
            requirement: format!("features {:?}", filter),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockBackend, MockConfig, MpcBackend, PoolMixingBackend};
    use crate::types::PrivacyModel;
    use std::sync::Arc;

    async fn registry() -> BackendRegistry {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(MockBackend::new(MockConfig::default()))).await;
        registry.register(Arc::new(PoolMixingBackend::default())).await;
        registry.register(Arc::new(MpcBackend::default())).await;
        registry
    }

    #[tokio::test]
    async fn test_priority_order() {
        let registry = registry().await;
        let best = get_best_backend(&registry, false).await.unwrap();
        assert_eq!(best.name(), "mpc-compute");
    }

    #[tokio::test]
    async fn test_viewing_keys_required() {
        let registry = registry().await;
        let best = get_best_backend(&registry, true).await.unwrap();
        assert_eq!(best.name(), "mock");
        assert!(best.features().viewing_keys);
    }

    #[tokio::test]
    async fn test_no_backend_with_viewing_keys() {
        let registry = BackendRegistry::new();
        registry.register(Arc::new(PoolMixingBackend::default())).await;
        assert!(matches!(
            get_best_backend(&registry, true).await,
            Err(RegistryError::NoBackendAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_custom_priority_is_strict() {
        let registry = registry().await;
        let selector = BackendSelector::new(vec!["pool-mixing".to_string()]);
        assert_eq!(
            selector.get_best_backend(&registry, false).await.unwrap().name(),
            "pool-mixing"
        );

        let none = BackendSelector::new(vec!["unknown".to_string()]);
        assert!(none.get_best_backend(&registry, false).await.is_err());
    }

    #[tokio::test]
    async fn test_by_features() {
        let registry = registry().await;

        let statistical = FeatureFilter::new().privacy_model(PrivacyModel::Statistical);
        assert_eq!(
            get_backend_by_features(&registry, &statistical).await.unwrap().name(),
            "pool-mixing"
        );

        let amount_hiding = FeatureFilter::new().amount_hiding(true);
        assert_eq!(
            get_backend_by_features(&registry, &amount_hiding).await.unwrap().name(),
            "mock"
        );

        let impossible = FeatureFilter::new()
            .privacy_model(PrivacyModel::Encryption)
            .viewing_keys(true);
        assert!(get_backend_by_features(&registry, &impossible).await.is_err());
    }
}
