use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

pub const DEFAULT_BCV_URL: &str = "https://www.bcv.org.ve/";
pub const DEFAULT_BINANCE_P2P_URL: &str =
    "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search";
pub const DEFAULT_OUTPUT_PATH: &str = "data.json";
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BcvProviderConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for BcvProviderConfig {
    fn default() -> Self {
        BcvProviderConfig {
            url: DEFAULT_BCV_URL.to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct BinanceP2pProviderConfig {
    pub url: String,
    pub asset: String,
    pub fiat: String,
    /// Number of top listings averaged per trade direction.
    pub rows: usize,
    pub timeout_secs: u64,
}

impl Default for BinanceP2pProviderConfig {
    fn default() -> Self {
        BinanceP2pProviderConfig {
            url: DEFAULT_BINANCE_P2P_URL.to_string(),
            asset: "USDT".to_string(),
            fiat: "VES".to_string(),
            rows: 5,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub bcv: BcvProviderConfig,
    pub binance_p2p: BinanceP2pProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub output_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location. A missing, unreadable or
    /// invalid file there never stops a refresh; the built-in defaults apply.
    pub fn load() -> Self {
        debug!("Loading default config");
        match Self::default_config_path() {
            Ok(config_path) => Self::load_or_default(config_path),
            Err(e) => {
                warn!(error = %e, "No config directory, using defaults");
                Self::default()
            }
        }
    }

    /// Like `load_from_path`, but falls back to the defaults instead of failing.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(error = %reason, "Ignoring config file, using defaults");
                Self::default()
            }
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("ve", "tasave", "tasave")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
