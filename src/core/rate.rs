//! Rate value objects and provider abstractions

use async_trait::async_trait;
use std::fmt::Display;

/// Official BCV rates, in VES per unit of foreign currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfficialRates {
    pub usd: f64,
    pub eur: f64,
}

/// Binance P2P USDT/VES prices, each rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketRates {
    pub buy: f64,
    pub sell: f64,
    pub average: f64,
}

/// Result of a single source fetch. A failed source never surfaces as an
/// error; it becomes `Unavailable` carrying the operator diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Available(T),
    Unavailable(String),
}

impl<T> FetchOutcome<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, FetchOutcome::Available(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            FetchOutcome::Available(value) => Some(value),
            FetchOutcome::Unavailable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            FetchOutcome::Available(_) => None,
            FetchOutcome::Unavailable(reason) => Some(reason),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for FetchOutcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Available(value),
            // `{:#}` keeps the whole anyhow context chain on one line
            Err(e) => FetchOutcome::Unavailable(format!("{e:#}")),
        }
    }
}

#[async_trait]
pub trait OfficialRateProvider: Send + Sync {
    async fn fetch_official_rates(&self) -> FetchOutcome<OfficialRates>;
}

#[async_trait]
pub trait MarketRateProvider: Send + Sync {
    async fn fetch_market_rates(&self) -> FetchOutcome<MarketRates>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn test_outcome_from_ok() {
        let result: anyhow::Result<OfficialRates> = Ok(OfficialRates {
            usd: 36.5,
            eur: 39.8,
        });
        let outcome = FetchOutcome::from(result);

        assert!(outcome.is_available());
        assert_eq!(outcome.value().map(|r| r.usd), Some(36.5));
        assert!(outcome.reason().is_none());
    }

    #[test]
    fn test_outcome_from_err_keeps_context_chain() {
        let result: anyhow::Result<MarketRates> =
            Err(anyhow!("connection reset")).context("BUY request failed");
        let outcome = FetchOutcome::from(result);

        assert!(!outcome.is_available());
        assert!(outcome.value().is_none());
        assert_eq!(
            outcome.reason(),
            Some("BUY request failed: connection reset")
        );
    }
}
