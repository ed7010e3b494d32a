//! Backend Registry Module
//!
//! Registration, default tracking, availability probing and selection.

pub mod backend_registry;
pub mod bootstrap;
pub mod selection;

pub use backend_registry::{
    BackendRegistry, ProbeOutcome, RegistryError, SharedBackend, DEFAULT_PROBE_TIMEOUT,
};
pub use bootstrap::create_default_registry;
pub use selection::{get_backend_by_features, get_best_backend, BackendSelector, DEFAULT_PRIORITY};
