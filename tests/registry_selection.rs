//! Registry probing and backend selection
//!
//! Uses hand-written backends whose status probe errors, panics or hangs to
//! check that availability filtering tolerates misbehaving adapters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use privacy_backends::types::FeatureFilter;
use privacy_backends::{
    create_default_registry, get_backend_by_features, get_best_backend, BackendError,
    BackendFeatures, BackendRegistry, BackendStatus, MockBackend, MockConfig, MpcBackend,
    PoolMixingBackend, PrivacyBackend, PrivacyConfig, PrivacyModel, ProbeOutcome, Quote,
    QuoteParams, RegistryError, SharedBackend, TeeBackend, TeeConfig, TokenInfo,
    TransferContext, TransferParams, TransferResult,
};

#[derive(Clone, Copy)]
enum Probe {
    Fails,
    Panics,
    Hangs,
}

/// Backend whose only behaviour is a misbehaving status probe
struct FlakyBackend {
    name: &'static str,
    probe: Probe,
}

#[async_trait]
impl PrivacyBackend for FlakyBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            amount_hiding: true,
            recipient_hiding: true,
            viewing_keys: true,
            same_chain_only: true,
            average_latency_ms: 1,
            privacy_model: PrivacyModel::Cryptographic,
        }
    }

    fn supported_tokens(&self) -> Vec<TokenInfo> {
        vec![TokenInfo::sol()]
    }

    async fn get_status(&self) -> Result<BackendStatus, BackendError> {
        match self.probe {
            Probe::Fails => Err(BackendError::unavailable(self.name, "rpc unreachable")),
            Probe::Panics => panic!("status probe exploded"),
            Probe::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(BackendStatus::available("devnet", 1))
            }
        }
    }

    async fn get_quote(&self, _params: &QuoteParams) -> Result<Quote, BackendError> {
        Err(BackendError::unavailable(self.name, "not quoting"))
    }

    async fn transfer(&self, _params: &TransferParams, _ctx: &TransferContext) -> TransferResult {
        TransferResult::failed("not transferring")
    }
}

fn flaky(name: &'static str, probe: Probe) -> SharedBackend {
    Arc::new(FlakyBackend { name, probe })
}

#[tokio::test]
async fn test_misbehaving_probes_are_unavailable() {
    let registry = BackendRegistry::with_probe_timeout(Duration::from_millis(100));
    registry.register(Arc::new(MockBackend::new(MockConfig::default()))).await;
    registry.register(flaky("erroring", Probe::Fails)).await;
    registry.register(flaky("panicking", Probe::Panics)).await;
    registry.register(flaky("hanging", Probe::Hangs)).await;
    registry.register(Arc::new(PoolMixingBackend::default())).await;

    let statuses = registry.get_statuses().await;
    let outcome = |name: &str| {
        statuses
            .iter()
            .find(|(b, _)| b.name() == name)
            .map(|(_, o)| o.clone())
            .unwrap()
    };
    assert!(matches!(outcome("erroring"), ProbeOutcome::Error(_)));
    assert_eq!(outcome("panicking"), ProbeOutcome::Panicked);
    assert_eq!(outcome("hanging"), ProbeOutcome::TimedOut);

    let names: Vec<String> = registry
        .get_available()
        .await
        .iter()
        .map(|b| b.name().to_string())
        .collect();
    assert_eq!(names, vec!["mock", "pool-mixing"]);
}

#[tokio::test]
async fn test_selection_ignores_failing_preferred_backend() {
    let registry = BackendRegistry::with_probe_timeout(Duration::from_millis(100));
    registry.register(flaky("tee-encryption", Probe::Fails)).await;
    registry.register(Arc::new(MpcBackend::default())).await;
    registry.register(Arc::new(MockBackend::new(MockConfig::default()))).await;

    assert_eq!(
        get_best_backend(&registry, false).await.unwrap().name(),
        "mpc-compute"
    );
    assert_eq!(get_best_backend(&registry, true).await.unwrap().name(), "mock");
}

#[tokio::test]
async fn test_best_backend_with_viewing_keys_has_them() {
    let registry = create_default_registry(&PrivacyConfig::default()).await.unwrap();

    let best = get_best_backend(&registry, true).await.unwrap();
    assert!(best.features().viewing_keys);
    assert_eq!(best.name(), "tee-encryption");

    registry.unregister("tee-encryption").await;
    let next = get_best_backend(&registry, true).await.unwrap();
    assert!(next.features().viewing_keys);
    assert_eq!(next.name(), "mock");

    registry.unregister("mock").await;
    assert!(matches!(
        get_best_backend(&registry, true).await,
        Err(RegistryError::NoBackendAvailable { .. })
    ));
}

#[tokio::test]
async fn test_register_unregister_round_trip() {
    let registry = BackendRegistry::new();
    let tee: SharedBackend = TeeBackend::shared(TeeConfig::default()).unwrap();

    registry.register(tee.clone()).await;
    assert_eq!(registry.size().await, 1);
    assert!(Arc::ptr_eq(&registry.get("tee-encryption").await.unwrap(), &tee));

    let removed = registry.unregister("tee-encryption").await.unwrap();
    assert!(Arc::ptr_eq(&removed, &tee));
    assert_eq!(registry.size().await, 0);
    assert!(registry.get_all().await.is_empty());
}

#[tokio::test]
async fn test_features_match_filters() {
    let registry = create_default_registry(&PrivacyConfig::default()).await.unwrap();

    for backend in registry.get_all().await {
        let features = backend.features();
        let exact = FeatureFilter::new()
            .amount_hiding(features.amount_hiding)
            .recipient_hiding(features.recipient_hiding)
            .viewing_keys(features.viewing_keys)
            .same_chain_only(features.same_chain_only)
            .privacy_model(features.privacy_model);
        assert!(exact.matches(&features), "{}", backend.name());
        assert_eq!(backend.features(), features);
    }

    let mpc = get_backend_by_features(&registry, &FeatureFilter::new().privacy_model(PrivacyModel::Mpc))
        .await
        .unwrap();
    assert_eq!(mpc.name(), "mpc-compute");
}

#[tokio::test]
async fn test_capabilities_follow_accessors() {
    let registry = create_default_registry(&PrivacyConfig::default()).await.unwrap();

    let mpc = registry.get("mpc-compute").await.unwrap();
    assert!(matches!(
        mpc.scan_payments("key", None).await,
        Err(BackendError::UnsupportedOperation { .. })
    ));

    let mock = registry.get("mock").await.unwrap();
    let stealth = mock.generate_stealth_address("recipient-meta").unwrap();
    assert!(!stealth.address.is_empty());
    assert_eq!(mock.get_balance("nobody", &TokenInfo::sol()).await.unwrap(), 0);
}
