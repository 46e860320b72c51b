//! The merged rate snapshot handed to the web app

use crate::core::rate::{
    FetchOutcome, MarketRateProvider, MarketRates, OfficialRateProvider, OfficialRates,
};
use anyhow::anyhow;
use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, instrument};

pub const SOURCE_LABEL: &str = "BCV + Binance P2P";

/// Separator between failure phrases in the serialized `error` field.
pub const FAILURE_SEPARATOR: &str = " | ";

/// A source that could not be fetched during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFailure {
    OfficialRates,
    MarketRates,
}

impl Display for SourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SourceFailure::OfficialRates => "Failed to fetch BCV rates",
                SourceFailure::MarketRates => "Failed to fetch Binance rates",
            }
        )
    }
}

impl FromStr for SourceFailure {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Failed to fetch BCV rates" => Ok(SourceFailure::OfficialRates),
            "Failed to fetch Binance rates" => Ok(SourceFailure::MarketRates),
            _ => Err(anyhow!("Unknown source failure: {}", s)),
        }
    }
}

/// One run's worth of rates. Unavailable sources are zero-filled and listed in
/// `failures`; consumers must not read those zeros as real rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub bcv_usd: f64,
    pub bcv_eur: f64,
    pub usdt_buy: f64,
    pub usdt_sell: f64,
    pub usdt_avg: f64,
    pub last_update: DateTime<Local>,
    pub source: String,
    #[serde(
        rename = "error",
        default,
        serialize_with = "serialize_failures",
        deserialize_with = "deserialize_failures"
    )]
    pub failures: Vec<SourceFailure>,
}

impl RateSnapshot {
    /// A zero-filled snapshot with no failures recorded.
    pub fn empty(last_update: DateTime<Local>) -> Self {
        RateSnapshot {
            bcv_usd: 0.0,
            bcv_eur: 0.0,
            usdt_buy: 0.0,
            usdt_sell: 0.0,
            usdt_avg: 0.0,
            last_update,
            source: SOURCE_LABEL.to_string(),
            failures: Vec::new(),
        }
    }

    /// Merges both fetch outcomes. Never fails: every unavailable source
    /// leaves its fields at zero and appends a failure, official source first.
    pub fn from_outcomes(
        official: &FetchOutcome<OfficialRates>,
        market: &FetchOutcome<MarketRates>,
        last_update: DateTime<Local>,
    ) -> Self {
        let mut snapshot = Self::empty(last_update);

        match official {
            FetchOutcome::Available(rates) => {
                snapshot.bcv_usd = rates.usd;
                snapshot.bcv_eur = rates.eur;
            }
            FetchOutcome::Unavailable(_) => snapshot.failures.push(SourceFailure::OfficialRates),
        }

        match market {
            FetchOutcome::Available(rates) => {
                snapshot.usdt_buy = rates.buy;
                snapshot.usdt_sell = rates.sell;
                snapshot.usdt_avg = rates.average;
            }
            FetchOutcome::Unavailable(_) => snapshot.failures.push(SourceFailure::MarketRates),
        }

        snapshot
    }

    /// The human readable failure note, `None` when every source succeeded.
    pub fn error_note(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(FAILURE_SEPARATOR),
        )
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

fn serialize_failures<S>(failures: &[SourceFailure], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if failures.is_empty() {
        return serializer.serialize_none();
    }
    let note = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(FAILURE_SEPARATOR);
    serializer.serialize_some(&note)
}

fn deserialize_failures<'de, D>(deserializer: D) -> Result<Vec<SourceFailure>, D::Error>
where
    D: Deserializer<'de>,
{
    let note: Option<String> = Option::deserialize(deserializer)?;
    match note {
        None => Ok(Vec::new()),
        Some(note) => note
            .split(FAILURE_SEPARATOR.trim())
            .map(|phrase| phrase.parse().map_err(serde::de::Error::custom))
            .collect(),
    }
}

/// Runs both providers concurrently and merges whatever they return.
#[instrument(name = "BuildSnapshot", skip_all)]
pub async fn build_snapshot(
    official: &dyn OfficialRateProvider,
    market: &dyn MarketRateProvider,
) -> RateSnapshot {
    let (official_outcome, market_outcome) = futures::join!(
        official.fetch_official_rates(),
        market.fetch_market_rates()
    );
    debug!(?official_outcome, ?market_outcome, "Fetched all sources");

    RateSnapshot::from_outcomes(&official_outcome, &market_outcome, Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap()
    }

    fn official_ok() -> FetchOutcome<OfficialRates> {
        FetchOutcome::Available(OfficialRates {
            usd: 36.50,
            eur: 39.80,
        })
    }

    fn market_ok() -> FetchOutcome<MarketRates> {
        FetchOutcome::Available(MarketRates {
            buy: 150.2,
            sell: 148.7,
            average: 149.45,
        })
    }

    struct StubOfficial(FetchOutcome<OfficialRates>);

    #[async_trait]
    impl OfficialRateProvider for StubOfficial {
        async fn fetch_official_rates(&self) -> FetchOutcome<OfficialRates> {
            self.0.clone()
        }
    }

    struct StubMarket(FetchOutcome<MarketRates>);

    #[async_trait]
    impl MarketRateProvider for StubMarket {
        async fn fetch_market_rates(&self) -> FetchOutcome<MarketRates> {
            self.0.clone()
        }
    }

    #[test]
    fn test_both_sources_available() {
        let snapshot = RateSnapshot::from_outcomes(&official_ok(), &market_ok(), fixed_time());

        assert_eq!(snapshot.bcv_usd, 36.50);
        assert_eq!(snapshot.bcv_eur, 39.80);
        assert_eq!(snapshot.usdt_buy, 150.2);
        assert_eq!(snapshot.usdt_sell, 148.7);
        assert_eq!(snapshot.usdt_avg, 149.45);
        assert_eq!(snapshot.source, SOURCE_LABEL);
        assert!(snapshot.is_complete());
        assert!(snapshot.error_note().is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_official_source_unavailable() {
        let official = FetchOutcome::Unavailable("HTTP 503".to_string());
        let snapshot = RateSnapshot::from_outcomes(&official, &market_ok(), fixed_time());

        assert_eq!(snapshot.bcv_usd, 0.0);
        assert_eq!(snapshot.bcv_eur, 0.0);
        assert_eq!(snapshot.usdt_avg, 149.45);
        assert_eq!(snapshot.failures, vec![SourceFailure::OfficialRates]);
        assert_eq!(
            snapshot.error_note().as_deref(),
            Some("Failed to fetch BCV rates")
        );
    }

    #[test]
    fn test_market_source_unavailable() {
        let market = FetchOutcome::Unavailable("no SELL listings".to_string());
        let snapshot = RateSnapshot::from_outcomes(&official_ok(), &market, fixed_time());

        assert_eq!(snapshot.bcv_usd, 36.50);
        assert_eq!(snapshot.usdt_buy, 0.0);
        assert_eq!(snapshot.usdt_sell, 0.0);
        assert_eq!(snapshot.usdt_avg, 0.0);
        assert_eq!(
            snapshot.error_note().as_deref(),
            Some("Failed to fetch Binance rates")
        );
    }

    #[test]
    fn test_both_sources_unavailable() {
        let official = FetchOutcome::Unavailable("timeout".to_string());
        let market = FetchOutcome::Unavailable("timeout".to_string());
        let snapshot = RateSnapshot::from_outcomes(&official, &market, fixed_time());

        assert_eq!(snapshot, {
            let mut expected = RateSnapshot::empty(fixed_time());
            expected.failures = vec![SourceFailure::OfficialRates, SourceFailure::MarketRates];
            expected
        });
        assert_eq!(
            snapshot.error_note().as_deref(),
            Some("Failed to fetch BCV rates | Failed to fetch Binance rates")
        );
    }

    #[test]
    fn test_serialized_keys_are_stable() {
        let snapshot = RateSnapshot::from_outcomes(&official_ok(), &market_ok(), fixed_time());
        let json = serde_json::to_value(&snapshot).unwrap();

        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "bcv_eur",
                "bcv_usd",
                "error",
                "last_update",
                "source",
                "usdt_avg",
                "usdt_buy",
                "usdt_sell"
            ]
        );
    }

    #[test]
    fn test_failures_survive_deserialization() {
        let official = FetchOutcome::Unavailable("bad html".to_string());
        let market = FetchOutcome::Unavailable("bad json".to_string());
        let snapshot = RateSnapshot::from_outcomes(&official, &market, fixed_time());

        let text = serde_json::to_string(&snapshot).unwrap();
        let parsed: RateSnapshot = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.failures, snapshot.failures);
        assert_eq!(parsed.last_update, snapshot.last_update);
    }

    #[test]
    fn test_unknown_failure_phrase_is_rejected() {
        assert!("Something else broke".parse::<SourceFailure>().is_err());
    }

    #[tokio::test]
    async fn test_build_snapshot_uses_both_providers() {
        let official = StubOfficial(official_ok());
        let market = StubMarket(FetchOutcome::Unavailable("down".to_string()));

        let snapshot = build_snapshot(&official, &market).await;

        assert_eq!(snapshot.bcv_eur, 39.80);
        assert_eq!(snapshot.usdt_sell, 0.0);
        assert_eq!(snapshot.failures, vec![SourceFailure::MarketRates]);
    }

    #[tokio::test]
    async fn test_build_snapshot_is_idempotent_apart_from_timestamp() {
        let official = StubOfficial(official_ok());
        let market = StubMarket(market_ok());

        let first = build_snapshot(&official, &market).await;
        let mut second = build_snapshot(&official, &market).await;
        second.last_update = first.last_update;

        assert_eq!(first, second);
    }
}
