//! Core business logic abstractions

pub mod config;
pub mod log;
pub mod rate;
pub mod snapshot;

// Re-export main types for cleaner imports
pub use rate::{FetchOutcome, MarketRateProvider, MarketRates, OfficialRateProvider, OfficialRates};
pub use snapshot::{RateSnapshot, SourceFailure, build_snapshot};
