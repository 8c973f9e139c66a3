// =============================================================================
// Central Application State — ChartForge Service
// =============================================================================
//
// Ties the configuration, the chart pipeline, and the operational error log
// together behind a single `Arc<AppState>` shared by every request handler.
//
// Thread safety:
//   - parking_lot::RwLock for mutable shared collections.
//   - The chart service manages its own round counter and published bundle.
// =============================================================================

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::chart::ChartService;
use crate::datasource::{HttpIndicatorSource, HttpPriceSource};
use crate::runtime_config::RuntimeConfig;

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// The production chart service wiring: both sources over HTTP.
pub type HttpChartService = ChartService<HttpIndicatorSource, HttpPriceSource>;

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Central application state shared across handlers via `Arc<AppState>`.
pub struct AppState {
    pub runtime_config: RwLock<RuntimeConfig>,
    pub chart_service: HttpChartService,
    /// Plain HTTP client for upstream passthroughs (symbol search).
    pub http: reqwest::Client,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct the full service wiring from the given configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        let indicator_source =
            HttpIndicatorSource::new(&config.upstream_base_url, config.request_timeout_secs);
        let price_source = HttpPriceSource::new(
            &config.upstream_base_url,
            config.upstream_api_key.clone(),
            config.request_timeout_secs,
        );

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        Self {
            runtime_config: RwLock::new(config),
            chart_service: ChartService::new(indicator_source, price_source),
            http,
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    /// Record an error message. The log is capped at [`MAX_RECENT_ERRORS`];
    /// oldest entries are evicted when the limit is reached.
    pub fn push_error(&self, message: impl Into<String>) {
        let record = ErrorRecord {
            message: message.into(),
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
