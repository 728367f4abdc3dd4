//! Runtime configuration
//!
//! Every fixed parameter of the pricing run lives here. Values come from a TOML
//! file (`--config <path>` or `~/.ebook-pricer/config.toml`) and fall back to
//! defaults field by field.
//!
//! ```toml
//! country = "GB"
//! historical_floor = "2002-01-02"
//! max_fallback_days = 9
//! request_delay_ms = 250
//! ```

use crate::error::{PricerError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CATALOG_URL: &str = "https://itunes.apple.com/search";
pub const DEFAULT_RATE_URL: &str = "http://api.nbp.pl/api/exchangerates/rates";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Storefront country code passed to the catalog
    #[serde(default = "default_country")]
    pub country: String,
    /// Currency every price is converted into
    #[serde(default = "default_target_currency")]
    pub target_currency: String,
    /// Earliest date the rate source publishes rates for
    #[serde(default = "default_historical_floor")]
    pub historical_floor: NaiveDate,
    /// Number of calendar days searched per resolution, the requested date included
    #[serde(default = "default_max_fallback_days")]
    pub max_fallback_days: u32,
    /// Pause after every external request
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,
    #[serde(default = "default_rate_url")]
    pub rate_url: String,
    /// NBP table letter (A holds mid rates)
    #[serde(default = "default_rate_table")]
    pub rate_table: String,
    #[serde(default = "default_media")]
    pub media: String,
    /// Also cache a fallback rate under the originally requested date
    #[serde(default)]
    pub alias_requested_date: bool,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_country() -> String {
    "US".to_string()
}

fn default_target_currency() -> String {
    "PLN".to_string()
}

fn default_historical_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2002, 1, 2).unwrap_or(NaiveDate::MIN)
}

fn default_max_fallback_days() -> u32 {
    9
}

fn default_request_delay_ms() -> u64 {
    100
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("exchange_rates.csv")
}

fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}

fn default_rate_url() -> String {
    DEFAULT_RATE_URL.to_string()
}

fn default_rate_table() -> String {
    "A".to_string()
}

fn default_media() -> String {
    "ebook".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            country: default_country(),
            target_currency: default_target_currency(),
            historical_floor: default_historical_floor(),
            max_fallback_days: default_max_fallback_days(),
            request_delay_ms: default_request_delay_ms(),
            cache_path: default_cache_path(),
            catalog_url: default_catalog_url(),
            rate_url: default_rate_url(),
            rate_table: default_rate_table(),
            media: default_media(),
            alias_requested_date: false,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist and parse. Without one, the default location
    /// is tried and silently skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(config_path) => Self::from_file(config_path)?,
            None => match Self::default_path() {
                Some(default_config) if default_config.exists() => {
                    log::debug!("Loading config from {}", default_config.display());
                    Self::from_file(&default_config)?
                }
                _ => Config::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            PricerError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| PricerError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// `~/.ebook-pricer/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ebook-pricer").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_fallback_days == 0 {
            return Err(PricerError::ConfigError(
                "max_fallback_days must be at least 1".to_string(),
            ));
        }
        if self.country.trim().is_empty() {
            return Err(PricerError::ConfigError("country must not be empty".to_string()));
        }
        if self.target_currency.trim().is_empty() {
            return Err(PricerError::ConfigError(
                "target_currency must not be empty".to_string(),
            ));
        }
        if self.rate_table.trim().is_empty() {
            return Err(PricerError::ConfigError("rate_table must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
