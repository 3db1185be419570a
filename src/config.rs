// =============================================================================
// Runtime Configuration — hot-reloadable engine settings with atomic save
// =============================================================================
//
// Central configuration hub for the rebalancer. Every tunable parameter lives
// here so the engine can be reconfigured without a restart for the pieces
// that support it (strategy enable/disable).
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{AccountMode, Environment};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_top_n() -> usize {
    10
}

fn default_rebalance_interval_days() -> u32 {
    22
}

fn default_cache_path() -> String {
    "data/cache.json".to_string()
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_period_days() -> u32 {
    365
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_ledger_root() -> String {
    "data/investors".to_string()
}

fn default_registry_path() -> String {
    "investors_registry.csv".to_string()
}

fn default_rebalance_flag_path() -> String {
    "data/last_rebalance.txt".to_string()
}

fn default_base_url() -> String {
    "https://paper-api.alpaca.markets".to_string()
}

// =============================================================================
// MarketDataConfig
// =============================================================================

/// Tunable parameters for the market-data cache and residual-retry loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataConfig {
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Look-back window requested from the provider, in calendar days.
    #[serde(default = "default_period_days")]
    pub period_days: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_true")]
    pub enable_retry: bool,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            cache_ttl_hours: default_cache_ttl_hours(),
            period_days: default_period_days(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            enable_retry: true,
        }
    }
}

// =============================================================================
// StrategyConfig
// =============================================================================

/// One single-account entry in the strategy fleet (C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Unique name, also used to resolve credential env vars
    /// (`{NAME}_API_KEY` / `{NAME}_API_SECRET`) when `api_key_env` /
    /// `api_secret_env` are left at their defaults.
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub account_mode: AccountMode,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    pub api_key_env: String,
    pub api_secret_env: String,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Which named universe (see `market_data::universe`) this strategy
    /// selects its basket from.
    pub universe: String,
}

/// Credentials and sizing for the single brokerage account driving the live
/// multi-bucket strategy (C9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStrategyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub account_mode: AccountMode,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    pub api_key_env: String,
    pub api_secret_env: String,

    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

// =============================================================================
// NotifierConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Env var holding the chat-transport bot token. Absence is tolerated at
    /// the config layer; the notifier itself treats it as "delivery
    /// disabled" rather than a hard startup failure.
    #[serde(default)]
    pub bot_token_env: Option<String>,

    #[serde(default)]
    pub admin_chat_ids: Vec<String>,

    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
}

fn default_confirmation_timeout_secs() -> u64 {
    30
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bot_token_env: None,
            admin_chat_ids: Vec::new(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the rebalancer.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_rebalance_interval_days")]
    pub rebalance_interval_days: u32,

    #[serde(default)]
    pub market_data: MarketDataConfig,

    #[serde(default = "default_ledger_root")]
    pub ledger_root: String,

    #[serde(default = "default_registry_path")]
    pub registry_path: String,

    #[serde(default = "default_rebalance_flag_path")]
    pub rebalance_flag_path: String,

    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,

    #[serde(default)]
    pub live_strategy: Option<LiveStrategyConfig>,

    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            rebalance_interval_days: default_rebalance_interval_days(),
            market_data: MarketDataConfig::default(),
            ledger_root: default_ledger_root(),
            registry_path: default_registry_path(),
            rebalance_flag_path: default_rebalance_flag_path(),
            strategies: Vec::new(),
            live_strategy: None,
            notifier: NotifierConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            environment = %config.environment,
            strategy_count = config.strategies.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
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

    /// Validate that there is at least one enabled strategy or a live
    /// strategy. Corresponds to the `ConfigMissing` startup condition.
    pub fn validate(&self) -> Result<(), crate::error::CoreError> {
        let any_enabled = self.strategies.iter().any(|s| s.enabled)
            || self.live_strategy.as_ref().is_some_and(|l| l.enabled);

        if !any_enabled {
            return Err(crate::error::CoreError::ConfigMissing(
                "no enabled strategies and no enabled live strategy".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.environment, Environment::Local);
        assert_eq!(cfg.rebalance_interval_days, 22);
        assert_eq!(cfg.market_data.cache_ttl_hours, 24);
        assert_eq!(cfg.market_data.max_retries, 3);
        assert!(cfg.market_data.enable_retry);
        assert!(cfg.strategies.is_empty());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.environment, Environment::Local);
        assert_eq!(cfg.rebalance_interval_days, 22);
        assert_eq!(cfg.ledger_root, "data/investors");
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "environment": "prod", "strategies": [] }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.environment, Environment::Prod);
        assert_eq!(cfg.market_data.max_retries, 3);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.ledger_root, cfg2.ledger_root);
        assert_eq!(cfg.rebalance_interval_days, cfg2.rebalance_interval_days);
    }

    #[test]
    fn validate_fails_with_no_enabled_strategies() {
        let cfg = RuntimeConfig::default();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_passes_with_one_enabled_strategy() {
        let mut cfg = RuntimeConfig::default();
        cfg.strategies.push(StrategyConfig {
            name: "low-risk".into(),
            enabled: true,
            account_mode: AccountMode::Paper,
            base_url: default_base_url(),
            api_key_env: "LOW_API_KEY".into(),
            api_secret_env: "LOW_API_SECRET".into(),
            top_n: 10,
            universe: "low".into(),
        });
        assert!(cfg.validate().is_ok());
    }
}
