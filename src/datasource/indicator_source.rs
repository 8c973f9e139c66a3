// =============================================================================
// Upstream Indicator API Client
// =============================================================================
//
// Fetches server-computed indicator payloads:
//
//   GET {base}/api/indicators/{symbol}?indicator=sma&period=20
//
// The payload inside the `{status, data, message}` envelope is returned raw —
// the chart adapter owns shape validation. Every failure mode here (network,
// HTTP status, error envelope) is an `Err`, which the chart service treats as
// "compute this indicator locally instead".
// =============================================================================

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::datasource::IndicatorSource;
use crate::indicators::{IndicatorKind, IndicatorParams};

/// HTTP implementation of [`IndicatorSource`].
#[derive(Clone)]
pub struct HttpIndicatorSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIndicatorSource {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

impl IndicatorSource for HttpIndicatorSource {
    async fn fetch(
        &self,
        symbol: &str,
        kind: IndicatorKind,
        params: &IndicatorParams,
    ) -> Result<Value> {
        if !kind.has_remote_source() {
            anyhow::bail!("{kind} has no upstream endpoint");
        }

        let url = format!("{}/api/indicators/{}", self.base_url, symbol);
        let query = query_params(kind, params);

        debug!(url = %url, indicator = %kind, "fetching server-computed indicator");

        let resp = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("indicator API request failed for {kind}"))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse indicator API response")?;

        if !status.is_success() {
            anyhow::bail!("indicator API returned {status}: {body}");
        }
        if body["status"].as_str() != Some("success") {
            let message = body["message"].as_str().unwrap_or("unknown upstream error");
            anyhow::bail!("indicator API reported failure: {message}");
        }

        Ok(body["data"].clone())
    }
}

/// Query parameters per indicator family, matching the upstream API's
/// parameter names.
fn query_params(kind: IndicatorKind, params: &IndicatorParams) -> Vec<(&'static str, String)> {
    let mut query = vec![("indicator", kind.wire_id().to_string())];
    match kind {
        IndicatorKind::Macd => {
            query.push(("fastPeriod", params.fast_period.to_string()));
            query.push(("slowPeriod", params.slow_period.to_string()));
            query.push(("signalPeriod", params.signal_period.to_string()));
        }
        IndicatorKind::Bollinger => {
            query.push(("period", params.period.to_string()));
            query.push(("deviations", params.std_dev_multiplier.to_string()));
        }
        _ => query.push(("period", params.period.to_string())),
    }
    query
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_query_carries_period() {
        let params = IndicatorParams::for_kind(IndicatorKind::Sma).with_period(50);
        let query = query_params(IndicatorKind::Sma, &params);
        assert!(query.contains(&("indicator", "sma".to_string())));
        assert!(query.contains(&("period", "50".to_string())));
    }

    #[test]
    fn macd_query_carries_three_periods() {
        let params = IndicatorParams::for_kind(IndicatorKind::Macd);
        let query = query_params(IndicatorKind::Macd, &params);
        assert!(query.contains(&("indicator", "macd".to_string())));
        assert!(query.contains(&("fastPeriod", "12".to_string())));
        assert!(query.contains(&("slowPeriod", "26".to_string())));
        assert!(query.contains(&("signalPeriod", "9".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "period"));
    }

    #[test]
    fn bollinger_query_uses_wire_id_and_deviations() {
        let params = IndicatorParams::for_kind(IndicatorKind::Bollinger);
        let query = query_params(IndicatorKind::Bollinger, &params);
        assert!(query.contains(&("indicator", "bb".to_string())));
        assert!(query.contains(&("period", "20".to_string())));
        assert!(query.contains(&("deviations", "2".to_string())));
    }
}
