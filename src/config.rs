//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Threshold and window tables may be partial — missing entries fall
//! back to the calibrated defaults. Secrets (the optional FRED API key)
//! are referenced by env-var name in the config and resolved at runtime
//! via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::signals::classifier::TierThresholds;
use crate::signals::proximity::{LONG_WINDOW, SHORT_WINDOW};

/// Default days of price history per evaluation.
const DEFAULT_LOOKBACK_DAYS: usize = 400;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub thresholds: TierThresholds,
    #[serde(default)]
    pub data_sources: DataSourcesConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub name: String,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    #[serde(default = "default_long_window")]
    pub long_window: usize,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: usize,
}

fn default_short_window() -> usize {
    SHORT_WINDOW
}
fn default_long_window() -> usize {
    LONG_WINDOW
}
fn default_lookback_days() -> usize {
    DEFAULT_LOOKBACK_DAYS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            short_window: SHORT_WINDOW,
            long_window: LONG_WINDOW,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DataSourcesConfig {
    pub fred_api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject window/lookback combinations the engine cannot evaluate.
    fn validate(&self) -> Result<()> {
        let e = &self.engine;
        if e.short_window == 0 || e.long_window == 0 {
            anyhow::bail!("engine windows must be non-zero");
        }
        let required = e.short_window.max(e.long_window);
        if e.lookback_days < required {
            anyhow::bail!(
                "lookback_days ({}) must cover the longest window ({required})",
                e.lookback_days
            );
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
