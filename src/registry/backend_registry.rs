//! Backend Registry
//!
//! Named backend instances plus the configured default. Availability is
//! probed live on every call; nothing is cached.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use super::selection::DEFAULT_PRIORITY;
use crate::backend::traits::PrivacyBackend;
use crate::common::logging::{log_backend_status, log_registry_event};
use crate::types::BackendStatus;

/// Shared handle to a registered backend
pub type SharedBackend = Arc<dyn PrivacyBackend>;

/// Default availability probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("backend not registered: {0}")]
    NotRegistered(String),

    #[error("no default backend configured")]
    NoDefault,

    #[error("no backend available ({requirement})")]
    NoBackendAvailable { requirement: String },
}

impl RegistryError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::NotRegistered(_) => "NOT_REGISTERED",
            RegistryError::NoDefault => "NO_DEFAULT",
            RegistryError::NoBackendAvailable { .. } => "NO_BACKEND_AVAILABLE",
        }
    }
}

/// Outcome of probing one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Status(BackendStatus),
    Error(String),
    TimedOut,
    Panicked,
}

impl ProbeOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Status(status) if status.available)
    }
}

#[derive(Default)]
struct RegistryState {
    backends: HashMap<String, SharedBackend>,
    /// Registration order
    order: Vec<String>,
    default: Option<String>,
}

impl RegistryState {
    fn ordered(&self) -> Vec<SharedBackend> {
        self.order
            .iter()
            .filter_map(|name| self.backends.get(name).cloned())
            .collect()
    }
}

/// Registry of privacy backends
pub struct BackendRegistry {
    state: RwLock<RegistryState>,
    probe_timeout: Duration,
    /// Order used by `get_best_backend`
    priority: Vec<String>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::with_probe_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_probe_timeout(probe_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            probe_timeout,
            priority: DEFAULT_PRIORITY.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the selection order used by `get_best_backend`
    pub fn with_priority(mut self, priority: Vec<String>) -> Self {
        self.priority = priority;
        self
    }

    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// Register a backend under its own name; a re-register replaces the
    /// instance but keeps its position
    pub async fn register(&self, backend: SharedBackend) {
        let name = backend.name().to_string();
        let mut state = self.state.write().await;
        let replaced = state.backends.insert(name.clone(), backend).is_some();
        if !replaced {
            state.order.push(name.clone());
        }
        drop(state);

        log_registry_event(
            if replaced { "backend_replaced" } else { "backend_registered" },
            &name,
            None,
        );
    }

    /// Remove a backend; the default name is left as configured
    pub async fn unregister(&self, name: &str) -> Option<SharedBackend> {
        let mut state = self.state.write().await;
        let removed = state.backends.remove(name);
        if removed.is_some() {
            state.order.retain(|n| n != name);
        }
        drop(state);

        if removed.is_some() {
            log_registry_event("backend_unregistered", name, None);
        }
        removed
    }

    pub async fn get(&self, name: &str) -> Result<SharedBackend, RegistryError> {
        self.state
            .read()
            .await
            .backends
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// All backends in registration order
    pub async fn get_all(&self) -> Vec<SharedBackend> {
        self.state.read().await.ordered()
    }

    pub async fn names(&self) -> Vec<String> {
        self.state.read().await.order.clone()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.state.read().await.backends.contains_key(name)
    }

    pub async fn size(&self) -> usize {
        self.state.read().await.backends.len()
    }

    pub async fn set_default(&self, name: &str) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        if !state.backends.contains_key(name) {
            return Err(RegistryError::NotRegistered(name.to_string()));
        }
        state.default = Some(name.to_string());
        drop(state);

        log_registry_event("default_changed", name, None);
        Ok(())
    }

    pub async fn default_name(&self) -> Option<String> {
        self.state.read().await.default.clone()
    }

    pub async fn get_default(&self) -> Result<SharedBackend, RegistryError> {
        let state = self.state.read().await;
        let name = state.default.as_ref().ok_or(RegistryError::NoDefault)?;
        state
            .backends
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotRegistered(name.clone()))
    }

    /// Probe every backend concurrently, one task each, under the probe timeout
    pub async fn get_statuses(&self) -> Vec<(SharedBackend, ProbeOutcome)> {
        let backends = self.get_all().await;
        let timeout = self.probe_timeout;

        let probes = backends.iter().cloned().map(|backend| {
            tokio::spawn(async move {
                let started = Instant::now();
                match tokio::time::timeout(timeout, backend.get_status()).await {
                    Ok(Ok(status)) => {
                        log_backend_status(
                            backend.name(),
                            &status,
                            started.elapsed().as_millis() as u64,
                        );
                        ProbeOutcome::Status(status)
                    }
                    Ok(Err(e)) => {
                        warn!(backend = backend.name(), error = %e, "status probe failed");
                        ProbeOutcome::Error(e.to_string())
                    }
                    Err(_) => {
                        warn!(
                            backend = backend.name(),
                            timeout_ms = timeout.as_millis() as u64,
                            "status probe timed out"
                        );
                        ProbeOutcome::TimedOut
                    }
                }
            })
        });

        let outcomes = join_all(probes).await;

        backends
            .into_iter()
            .zip(outcomes)
            .map(|(backend, joined)| {
                let outcome = joined.unwrap_or_else(|e| {
                    warn!(backend = backend.name(), error = %e, "status probe panicked");
                    ProbeOutcome::Panicked
                });
                (backend, outcome)
            })
            .collect()
    }

    /// Backends whose probe reported available, in registration order
    pub async fn get_available(&self) -> Vec<SharedBackend> {
        self.get_statuses()
            .await
            .into_iter()
            .filter(|(_, outcome)| outcome.is_available())
            .map(|(backend, _)| backend)
            .collect()
    }
}
