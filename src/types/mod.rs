//! Shared Types Module
//!
//! Data model shared by the backend contract, adapters and registry.

pub mod events;
pub mod features;
pub mod payment;
pub mod quote;
pub mod status;
pub mod token;
pub mod transfer;
pub mod units;

// Re-exports for convenience
pub use events::{ProofKind, StatusData, TransferEvent};
pub use features::{BackendFeatures, FeatureFilter, PrivacyModel};
pub use payment::{ScannedPayment, StealthAddress};
pub use quote::{Quote, QuoteParams, DEFAULT_QUOTE_TTL_SECS};
pub use status::BackendStatus;
pub use token::TokenInfo;
pub use transfer::{PrivacyLevel, TransferParams, TransferResult, TransferStatus};
pub use units::{
    bps_of, format_base_units, format_with_commas, parse_amount, to_base_units, Amount,
    BPS_DENOMINATOR, LAMPORTS_PER_SOL,
};
