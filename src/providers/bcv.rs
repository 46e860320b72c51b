use super::util::is_certificate_error;
use crate::core::config::{BROWSER_USER_AGENT, BcvProviderConfig};
use crate::core::{FetchOutcome, OfficialRateProvider, OfficialRates};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const USD_CONTAINER: &str = "dolar";
const EUR_CONTAINER: &str = "euro";

/// Scrapes the official USD and EUR rates from the BCV home page.
pub struct BcvProvider {
    url: String,
    timeout: Duration,
}

impl BcvProvider {
    pub fn new(config: &BcvProviderConfig) -> Self {
        BcvProvider {
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn client(&self, accept_invalid_certs: bool) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to build HTTP client")
    }

    /// GETs the page once with certificate validation, and once more without
    /// it only when the first attempt failed on TLS.
    async fn fetch_page(&self) -> Result<String> {
        debug!("Requesting BCV page from {}", self.url);

        let response = match self.client(false)?.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) if is_certificate_error(&e) => {
                warn!(error = %e, "SSL verification failed, retrying without verification");
                self.client(true)?
                    .get(&self.url)
                    .send()
                    .await
                    .with_context(|| format!("Request error without verification: {}", self.url))?
            }
            Err(e) => return Err(e).with_context(|| format!("Request error: {}", self.url)),
        };

        let response = response
            .error_for_status()
            .context("BCV returned an error status")?;

        response
            .text()
            .await
            .context("Failed to read BCV response body")
    }
}

/// Extracts both rates from the BCV page. Fails unless both parse.
pub fn parse_official_rates(html: &str) -> Result<OfficialRates> {
    let document = Html::parse_document(html);

    let usd = extract_rate(&document, USD_CONTAINER)?;
    let eur = extract_rate(&document, EUR_CONTAINER)?;

    Ok(OfficialRates { usd, eur })
}

fn extract_rate(document: &Html, container_id: &str) -> Result<f64> {
    let css = format!("div#{container_id} strong");
    let selector =
        Selector::parse(&css).map_err(|e| anyhow!("Invalid selector '{}': {:?}", css, e))?;

    let text: String = document
        .select(&selector)
        .next()
        .ok_or_else(|| anyhow!("No <strong> rate inside #{}", container_id))?
        .text()
        .collect();

    parse_rate_text(&text).with_context(|| format!("Invalid rate in #{container_id}"))
}

/// Parses a BCV formatted number such as ` 36,50130000 `.
fn parse_rate_text(text: &str) -> Result<f64> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let rate: f64 = normalized
        .parse()
        .with_context(|| format!("Not a number: '{}'", text.trim()))?;

    // A zero or negative rate means the page did not carry a real value
    if !rate.is_finite() || rate <= 0.0 {
        return Err(anyhow!("Rate out of range: {}", rate));
    }
    Ok(rate)
}

#[async_trait]
impl OfficialRateProvider for BcvProvider {
    #[instrument(name = "BcvRatesFetch", skip(self), fields(url = %self.url))]
    async fn fetch_official_rates(&self) -> FetchOutcome<OfficialRates> {
        let result = self
            .fetch_page()
            .await
            .and_then(|html| parse_official_rates(&html));

        let outcome = FetchOutcome::from(result);
        match &outcome {
            FetchOutcome::Available(rates) => {
                debug!(usd = rates.usd, eur = rates.eur, "Parsed BCV rates")
            }
            FetchOutcome::Unavailable(reason) => {
                warn!(error = %reason, "Could not extract BCV rates")
            }
        }
        outcome
    }
}
