// =============================================================================
// Runtime Configuration — service settings with atomic save
// =============================================================================
//
// Central configuration for the charting service: where the upstream
// market-data API lives, request timeouts, and the defaults applied when a
// chart request leaves a field unspecified.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chart::ChartType;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_upstream_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_interval() -> String {
    "daily".to_string()
}

fn default_period() -> String {
    "1y".to_string()
}

fn default_chart_type() -> ChartType {
    ChartType::Candlestick
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Service configuration, loadable from JSON and overridable per field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Base URL of the upstream market-data backend.
    #[serde(default = "default_upstream_base_url")]
    pub upstream_base_url: String,

    /// Optional API key forwarded to the upstream provider.
    #[serde(default)]
    pub upstream_api_key: Option<String>,

    /// Per-request timeout for upstream calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Interval applied when a chart request does not specify one.
    #[serde(default = "default_interval")]
    pub default_interval: String,

    /// Period applied when a chart request does not specify one.
    #[serde(default = "default_period")]
    pub default_period: String,

    /// Chart type applied when a chart request does not specify one.
    #[serde(default = "default_chart_type")]
    pub default_chart_type: ChartType,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: default_upstream_base_url(),
            upstream_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            default_interval: default_interval(),
            default_period: default_period(),
            default_chart_type: default_chart_type(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }

    /// Save configuration atomically: write to `<path>.tmp`, then rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");

        let raw = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(&tmp, raw)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to rename {} into place", tmp.display()))?;

        info!(path = %path.display(), "runtime config saved");
        Ok(())
    }
}
