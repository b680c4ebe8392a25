// =============================================================================
// Runtime Configuration — service settings with atomic save
// =============================================================================
//
// Every tunable of the service lives here: provider endpoint, refresh
// cadence, cache window and bound, request timeout, history/news sizing and
// the indicator look-backs used by the API.
//
// Secrets (provider API key, admin token) are never stored here; they come
// from the environment.
//
// Persistence uses an atomic tmp + rename pattern.  All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an older
// config file.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_FRESHNESS};
use crate::indicators::IndicatorParams;
use crate::market_data::DEFAULT_BASE_URL;

pub const CONFIG_PATH: &str = "alpha_vision_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_provider_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_refresh_interval_secs() -> u64 {
    15
}

fn default_cache_freshness_secs() -> u64 {
    DEFAULT_FRESHNESS.as_secs()
}

fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_history_interval() -> String {
    "5min".to_string()
}

fn default_history_limit() -> usize {
    100
}

fn default_news_limit() -> usize {
    5
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Provider ------------------------------------------------------------

    /// Base URL of the market-data REST provider.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Refresh & cache -----------------------------------------------------

    /// Seconds between market-data refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Responses younger than this are served from the cache.
    #[serde(default = "default_cache_freshness_secs")]
    pub cache_freshness_secs: u64,

    /// Maximum distinct cached requests.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Serve the last stored payload when a fetch fails.
    #[serde(default)]
    pub serve_stale_on_error: bool,

    /// Portfolio summaries report tickers that had no quote.
    #[serde(default)]
    pub strict_quotes: bool,

    // --- Payload sizing ------------------------------------------------------

    #[serde(default = "default_history_interval")]
    pub history_interval: String,

    /// Bars kept from the intraday history.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Articles requested per ticker.
    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    // --- Indicators ----------------------------------------------------------

    #[serde(default)]
    pub indicators: IndicatorParams,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider_base_url: default_provider_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            cache_freshness_secs: default_cache_freshness_secs(),
            cache_capacity: default_cache_capacity(),
            serve_stale_on_error: false,
            strict_quotes: false,
            history_interval: default_history_interval(),
            history_limit: default_history_limit(),
            news_limit: default_news_limit(),
            indicators: IndicatorParams::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing or unreadable file is an error so the caller can fall back
    /// to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            provider = %config.provider_base_url,
            refresh_secs = config.refresh_interval_secs,
            cache_secs = config.cache_freshness_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist to `path` via a temporary sibling file and a rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Refresh period, never shorter than one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn cache_freshness(&self) -> Duration {
        Duration::from_secs(self.cache_freshness_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.provider_base_url, "https://financialmodelingprep.com/api/v3");
        assert_eq!(cfg.refresh_interval_secs, 15);
        assert_eq!(cfg.cache_freshness_secs, 60);
        assert_eq!(cfg.cache_capacity, 512);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert!(!cfg.serve_stale_on_error);
        assert_eq!(cfg.history_limit, 100);
        assert_eq!(cfg.news_limit, 5);
        assert_eq!(cfg.indicators.rsi_period, 14);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "refresh_interval_secs": 30, "indicators": { "sma_period": 50 } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.refresh_interval_secs, 30);
        assert_eq!(cfg.indicators.sma_period, 50);
        assert_eq!(cfg.indicators.ema_period, 12);
        assert_eq!(cfg.cache_freshness_secs, 60);
    }

    #[test]
    fn zero_durations_are_clamped() {
        let cfg = RuntimeConfig {
            refresh_interval_secs: 0,
            request_timeout_secs: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.refresh_interval(), Duration::from_secs(1));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = std::env::temp_dir().join(format!("alpha_vision_cfg_{}.json", uuid::Uuid::new_v4()));
        let cfg = RuntimeConfig {
            serve_stale_on_error: true,
            news_limit: 3,
            ..RuntimeConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = RuntimeConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(RuntimeConfig::load("/nonexistent/alpha_vision_config.json").is_err());
    }
}
