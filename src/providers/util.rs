use rust_decimal::{Decimal, RoundingStrategy};
use std::error::Error;

/// Substrings that identify a TLS/certificate failure somewhere in a
/// transport error's source chain.
const TLS_FAILURE_MARKERS: &[&str] = &["certificate", "tls", "ssl", "handshake"];

/// Returns true when a request failed while establishing the connection
/// because of TLS or certificate validation. Timeouts, refused connections
/// and HTTP status errors are not certificate errors.
pub fn is_certificate_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_status() || !(err.is_connect() || err.is_request()) {
        return false;
    }

    let mut messages = Vec::new();
    let mut source: Option<&(dyn Error + 'static)> = err.source();
    while let Some(e) = source {
        messages.push(e.to_string());
        source = e.source();
    }
    chain_mentions_tls_failure(messages.iter().map(String::as_str))
}

fn chain_mentions_tls_failure<'a>(mut messages: impl Iterator<Item = &'a str>) -> bool {
    messages.any(|message| {
        let message = message.to_lowercase();
        TLS_FAILURE_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    })
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Rounds to 2 decimal places using the exact binary value of `value`, with
/// ties going to the even digit. Non-finite values are returned unchanged.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_string().parse().ok())
        .unwrap_or(value)
}
