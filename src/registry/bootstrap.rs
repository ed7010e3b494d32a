//! Registry Bootstrap
//!
//! Builds a registry holding every built-in backend from a `PrivacyConfig`.

use std::sync::Arc;

use super::backend_registry::BackendRegistry;
use crate::adapters::{
    MockBackend, MockConfig, MpcBackend, MpcConfig, PoolMixingBackend, PoolMixingConfig,
    TeeBackend, TeeConfig,
};
use crate::backend::simulation::SimulationConfig;
use crate::common::config::PrivacyConfig;
use crate::common::error::Result;
use crate::common::logging::log_system_event;

/// Register the built-in backends and set the configured default
///
/// The mock backend is skipped on networks that do not allow it.
pub async fn create_default_registry(config: &PrivacyConfig) -> Result<BackendRegistry> {
    config.validate()?;

    let simulation = SimulationConfig::from_config(config);
    let registry = BackendRegistry::with_probe_timeout(config.probe_timeout)
        .with_priority(config.backend_priority.clone());

    registry
        .register(TeeBackend::shared(TeeConfig {
            simulation: simulation.clone(),
            ..Default::default()
        })?)
        .await;

    registry
        .register(MpcBackend::shared(
            MpcConfig {
                simulation: simulation.clone(),
                ..Default::default()
            }
            .with_rounds(config.mpc_rounds),
        ))
        .await;

    registry
        .register(PoolMixingBackend::shared(PoolMixingConfig {
            simulation: simulation.clone(),
            ..Default::default()
        }))
        .await;

    if config.network.allows_mock() {
        let mock = MockConfig {
            simulation,
            ..Default::default()
        }
        .with_latency_ms(config.mock_latency_ms)
        .with_failure_rate(config.mock_failure_rate);
        registry.register(Arc::new(MockBackend::new(mock))).await;
    }

    registry.set_default(&config.default_backend).await?;

    log_system_event(
        "registry_ready",
        serde_json::json!({
            "network": config.network.as_str(),
            "backends": registry.names().await,
            "default": config.default_backend,
        }),
        None,
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Network;
    use crate::common::error::Error;
    use crate::registry::RegistryError;

    #[tokio::test]
    async fn test_devnet_registry() {
        let registry = create_default_registry(&PrivacyConfig::default()).await.unwrap();
        assert_eq!(registry.size().await, 4);
        assert_eq!(
            registry.names().await,
            vec!["tee-encryption", "mpc-compute", "pool-mixing", "mock"]
        );
        assert_eq!(registry.get_default().await.unwrap().name(), "mock");
    }

    #[tokio::test]
    async fn test_mainnet_registry_has_no_mock() {
        let config = PrivacyConfig {
            network: Network::Mainnet,
            default_backend: "tee-encryption".to_string(),
            ..Default::default()
        };
        let registry = create_default_registry(&config).await.unwrap();
        assert!(!registry.has("mock").await);
        assert_eq!(registry.get_default().await.unwrap().name(), "tee-encryption");
    }

    #[tokio::test]
    async fn test_unknown_default_rejected() {
        let config = PrivacyConfig {
            default_backend: "zk-rollup".to_string(),
            ..Default::default()
        };
        let err = create_default_registry(&config).await.err().unwrap();
        assert!(matches!(err, Error::Registry(RegistryError::NotRegistered(_))));
    }

    #[tokio::test]
    async fn test_mpc_rounds_from_config() {
        let config = PrivacyConfig {
            mpc_rounds: 5,
            ..Default::default()
        };
        let registry = create_default_registry(&config).await.unwrap();
        let quote = registry
            .get("mpc-compute")
            .await
            .unwrap()
            .get_quote(&crate::types::QuoteParams::new(
                crate::types::TokenInfo::sol(),
                1_000_000_000,
            ))
            .await
            .unwrap();
        assert_eq!(quote.metadata["rounds"], 5);
    }

    #[tokio::test]
    async fn test_priority_from_config() {
        let config = PrivacyConfig {
            backend_priority: vec!["pool-mixing".to_string(), "mock".to_string()],
            ..Default::default()
        };
        let registry = create_default_registry(&config).await.unwrap();
        assert_eq!(registry.priority(), ["pool-mixing", "mock"]);

        let best = crate::registry::get_best_backend(&registry, false).await.unwrap();
        assert_eq!(best.name(), "pool-mixing");
        let best = crate::registry::get_best_backend(&registry, true).await.unwrap();
        assert_eq!(best.name(), "mock");
    }
}
