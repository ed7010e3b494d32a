//! Backend Contract Module
//!
//! The `PrivacyBackend` trait, its capability traits, event delivery and
//! the simulation helpers shared by the adapters.

pub mod error;
pub mod events;
pub mod rng;
pub mod simulation;
pub mod traits;

pub use error::{BackendError, BackendResult};
pub use events::{
    check_event_sequence, drain_events, EventSink, TransferContext, TransferReporter,
    DEFAULT_EVENT_BUFFER, RESERVED_SLOTS,
};
pub use rng::{os_random, OsRandom, RandomSource, SeededRandom, SharedRandom};
pub use simulation::SimulationConfig;
pub use traits::{BalanceProvider, PaymentScanner, PrivacyBackend, StealthAddressGenerator};
