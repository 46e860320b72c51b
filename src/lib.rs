pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

/// Runs one refresh: fetch both sources, then write the snapshot file.
pub async fn run(config_path: Option<&str>, output: Option<&str>) -> Result<()> {
    info!("TasaVe refresh starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load(),
    };
    debug!("Loaded config: {config:#?}");

    cli::refresh::refresh(&config, output).await?;
    Ok(())
}
