use super::ui;
use crate::core::config::AppConfig;
use crate::core::{
    MarketRateProvider, OfficialRateProvider, RateSnapshot, SourceFailure, build_snapshot,
};
use crate::providers::{BcvProvider, BinanceP2pProvider};
use crate::store::JsonSnapshotFile;
use anyhow::Result;
use comfy_table::Cell;
use tracing::info;

impl RateSnapshot {
    pub fn display_as_table(&self) -> String {
        let official_ok = !self.failures.contains(&SourceFailure::OfficialRates);
        let market_ok = !self.failures.contains(&SourceFailure::MarketRates);

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Source"),
            ui::header_cell("Rate"),
            ui::header_cell("VES"),
        ]);

        let rows = [
            ("BCV", "USD", self.bcv_usd, official_ok),
            ("BCV", "EUR", self.bcv_eur, official_ok),
            ("Binance P2P", "USDT buy", self.usdt_buy, market_ok),
            ("Binance P2P", "USDT sell", self.usdt_sell, market_ok),
            ("Binance P2P", "USDT average", self.usdt_avg, market_ok),
        ];
        for (source, rate, value, available) in rows {
            table.add_row(vec![
                Cell::new(source),
                Cell::new(rate),
                ui::rate_cell(value, available),
            ]);
        }

        let mut output = format!(
            "{}\n\n",
            ui::style_text(&self.source, ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!("Last update: {}", self.last_update.to_rfc3339()),
                ui::StyleType::Subtle
            )
        ));
        if let Some(note) = self.error_note() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(&format!("Error: {note}"), ui::StyleType::Failure)
            ));
        }

        output
    }
}

/// Printed before the fetch starts; the spinner is not drawn off a terminal.
const FETCH_LINES: [&str; 3] = [
    "Starting exchange rate fetch...",
    "Fetching BCV rates...",
    "Fetching Binance P2P rates...",
];

fn status_lines(snapshot: &RateSnapshot) -> Vec<String> {
    let mut lines = Vec::new();

    if snapshot.failures.contains(&SourceFailure::OfficialRates) {
        lines.push(ui::status_line(false, "Failed to fetch BCV rates"));
    } else {
        lines.push(ui::status_line(
            true,
            &format!(
                "BCV rates: USD={}, EUR={}",
                snapshot.bcv_usd, snapshot.bcv_eur
            ),
        ));
    }

    if snapshot.failures.contains(&SourceFailure::MarketRates) {
        lines.push(ui::status_line(false, "Failed to fetch Binance P2P rates"));
    } else {
        lines.push(ui::status_line(
            true,
            &format!(
                "Binance P2P rates: Buy={}, Sell={}, Avg={}",
                snapshot.usdt_buy, snapshot.usdt_sell, snapshot.usdt_avg
            ),
        ));
    }

    lines
}

/// Fetches both sources, prints the outcome and writes the snapshot file.
/// Only a failed write makes this return an error.
pub async fn refresh_with(
    official: &dyn OfficialRateProvider,
    market: &dyn MarketRateProvider,
    file: &JsonSnapshotFile,
) -> Result<RateSnapshot> {
    for line in FETCH_LINES {
        println!("{line}");
    }

    let spinner = ui::new_spinner("Fetching BCV and Binance P2P rates...");
    let snapshot = build_snapshot(official, market).await;
    spinner.finish_and_clear();

    for line in status_lines(&snapshot) {
        println!("{line}");
    }
    println!("\n{}\n", snapshot.display_as_table());

    if let Err(e) = file.write(&snapshot) {
        println!(
            "{}",
            ui::status_line(
                false,
                &format!("Error writing {}: {e:#}", file.path().display())
            )
        );
        return Err(e);
    }

    println!(
        "{}",
        ui::status_line(
            true,
            &format!(
                "{} generated successfully at {}",
                file.path().display(),
                snapshot.last_update.to_rfc3339()
            )
        )
    );
    info!(
        complete = snapshot.is_complete(),
        "Snapshot written to {}",
        file.path().display()
    );
    Ok(snapshot)
}

/// Builds the configured providers and runs a refresh. `output` overrides
/// the configured output path.
pub async fn refresh(config: &AppConfig, output: Option<&str>) -> Result<RateSnapshot> {
    let official = BcvProvider::new(&config.providers.bcv);
    let market = BinanceP2pProvider::new(&config.providers.binance_p2p);
    let file = JsonSnapshotFile::new(output.unwrap_or(&config.output_path));

    refresh_with(&official, &market, &file).await
}
