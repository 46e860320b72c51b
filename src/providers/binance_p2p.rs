use super::util::{mean, round2};
use crate::core::config::{BROWSER_USER_AGENT, BinanceP2pProviderConfig};
use crate::core::{FetchOutcome, MarketRateProvider, MarketRates};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Direction of the adverts requested from the P2P order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    /// Adverts from users selling the asset, i.e. where we would buy.
    Buy,
    Sell,
}

impl Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TradeType::Buy => "BUY",
                TradeType::Sell => "SELL",
            }
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdvertSearchRequest<'a> {
    asset: &'a str,
    fiat: &'a str,
    merchant_check: bool,
    page: u32,
    pay_types: Vec<String>,
    publisher_type: Option<String>,
    rows: usize,
    trade_type: TradeType,
}

#[derive(Debug, Deserialize)]
struct AdvertSearchResponse {
    #[serde(default)]
    data: Option<Vec<AdvertEntry>>,
}

#[derive(Debug, Deserialize)]
struct AdvertEntry {
    adv: Option<Advert>,
}

#[derive(Debug, Deserialize)]
struct Advert {
    price: Option<String>,
}

/// Averages the top Binance P2P adverts on each side of the book.
pub struct BinanceP2pProvider {
    url: String,
    asset: String,
    fiat: String,
    rows: usize,
    timeout: Duration,
}

impl BinanceP2pProvider {
    pub fn new(config: &BinanceP2pProviderConfig) -> Self {
        BinanceP2pProvider {
            url: config.url.clone(),
            asset: config.asset.clone(),
            fiat: config.fiat.clone(),
            rows: config.rows,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn fetch_prices(
        &self,
        client: &reqwest::Client,
        trade_type: TradeType,
    ) -> Result<Vec<f64>> {
        let payload = AdvertSearchRequest {
            asset: &self.asset,
            fiat: &self.fiat,
            merchant_check: false,
            page: 1,
            pay_types: Vec::new(),
            publisher_type: None,
            rows: self.rows,
            trade_type,
        };
        debug!("Requesting {} adverts from {}", trade_type, self.url);

        let response = client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("{trade_type} request failed"))?
            .error_for_status()
            .with_context(|| format!("{trade_type} request returned an error status"))?;

        let response_text = response
            .text()
            .await
            .with_context(|| format!("Failed to read {trade_type} response body"))?;

        let search: AdvertSearchResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse P2P search response"
                );
                return Err(e).with_context(|| format!("Invalid {trade_type} response"));
            }
        };

        Ok(extract_prices(search, self.rows))
    }

    async fn fetch(&self) -> Result<MarketRates> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let buy_prices = self.fetch_prices(&client, TradeType::Buy).await?;
        let sell_prices = self.fetch_prices(&client, TradeType::Sell).await?;
        debug!(?buy_prices, ?sell_prices, "Collected P2P prices");

        let (Some(buy), Some(sell)) = (mean(&buy_prices), mean(&sell_prices)) else {
            return Err(anyhow!(
                "Not enough P2P prices: {} BUY, {} SELL",
                buy_prices.len(),
                sell_prices.len()
            ));
        };

        Ok(MarketRates {
            buy: round2(buy),
            sell: round2(sell),
            average: round2((buy + sell) / 2.0),
        })
    }
}

/// Prices of the first `rows` adverts. Adverts without a numeric price are
/// skipped rather than failing the whole side.
fn extract_prices(search: AdvertSearchResponse, rows: usize) -> Vec<f64> {
    search
        .data
        .unwrap_or_default()
        .into_iter()
        .take(rows)
        .filter_map(|entry| entry.adv.and_then(|adv| adv.price))
        .filter_map(|price| price.trim().parse::<f64>().ok())
        .filter(|price| price.is_finite())
        .collect()
}

#[async_trait]
impl MarketRateProvider for BinanceP2pProvider {
    #[instrument(
        name = "BinanceP2pFetch",
        skip(self),
        fields(asset = %self.asset, fiat = %self.fiat)
    )]
    async fn fetch_market_rates(&self) -> FetchOutcome<MarketRates> {
        let outcome = FetchOutcome::from(self.fetch().await);
        match &outcome {
            FetchOutcome::Available(rates) => debug!(?rates, "Computed P2P rates"),
            FetchOutcome::Unavailable(reason) => {
                warn!(error = %reason, "Could not get enough Binance P2P prices")
            }
        }
        outcome
    }
}
