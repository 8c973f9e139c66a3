// =============================================================================
// Upstream Price API Client
// =============================================================================
//
// Talks to the market-data backend:
//
//   GET {base}/api/stocks/{symbol}?interval=daily&period=1y
//
// Responses use the `{status, data, message}` envelope, with numeric fields
// that may arrive as JSON strings. Bars that cannot be given a timestamp or
// that break the OHLC envelope are dropped during normalization; a bar with
// a missing or unparseable close is kept with a hole so the indicator
// engine's own validity rules decide its fate.
// =============================================================================

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::chart::adapter::{parse_f64, parse_timestamp};
use crate::datasource::{PriceQuery, PriceSource};
use crate::market_data::{PriceBar, PriceSeries};

/// HTTP implementation of [`PriceSource`].
#[derive(Clone)]
pub struct HttpPriceSource {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpPriceSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }
}

impl PriceSource for HttpPriceSource {
    async fn fetch(&self, query: &PriceQuery) -> Result<PriceSeries> {
        let url = format!("{}/api/stocks/{}", self.base_url, query.symbol);

        let mut params: Vec<(&str, String)> = vec![("interval", query.interval.clone())];
        if let Some(period) = &query.period {
            params.push(("period", period.clone()));
        }
        if let Some(start) = &query.start_date {
            params.push(("startDate", start.clone()));
        }
        if let Some(end) = &query.end_date {
            params.push(("endDate", end.clone()));
        }
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }

        debug!(url = %url, symbol = %query.symbol, interval = %query.interval, "fetching price series");

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .context("price API request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse price API response")?;

        if !status.is_success() {
            anyhow::bail!("price API returned {status}: {body}");
        }
        if body["status"].as_str() != Some("success") {
            let message = body["message"].as_str().unwrap_or("unknown upstream error");
            anyhow::bail!("price API reported failure: {message}");
        }

        parse_price_series(&body["data"], &query.interval)
    }
}

/// Parse the `data` member of a successful envelope into a normalized series.
pub(crate) fn parse_price_series(data: &Value, fallback_interval: &str) -> Result<PriceSeries> {
    let symbol = data["symbol"]
        .as_str()
        .context("price payload missing 'symbol'")?
        .to_string();
    let interval = data["interval"]
        .as_str()
        .unwrap_or(fallback_interval)
        .to_string();
    let rows = data["prices"]
        .as_array()
        .context("price payload missing 'prices' array")?;

    let mut bars = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        match parse_price_bar(row) {
            Some(bar) => bars.push(bar),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(symbol = %symbol, skipped, "skipped unparseable price rows");
    }

    let mut series = PriceSeries::new(symbol, interval, bars);
    if let Some(last_refreshed) = data["lastRefreshed"].as_str() {
        series = series.with_last_refreshed(last_refreshed);
    }
    Ok(series)
}

/// Parse one price row. `None` when the row has no usable timestamp or
/// high/low — without those the bar cannot be placed or ranged. Open and
/// close fall back to NaN holes.
fn parse_price_bar(row: &Value) -> Option<PriceBar> {
    let timestamp = parse_timestamp(&row["timestamp"])?;
    let high = parse_f64(&row["high"])?;
    let low = parse_f64(&row["low"])?;

    let open = parse_f64(&row["open"]).unwrap_or(f64::NAN);
    let close = parse_f64(&row["close"]).unwrap_or(f64::NAN);

    let volume = match &row["volume"] {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };

    Some(PriceBar {
        timestamp,
        open,
        high,
        low,
        close,
        volume,
    })
}
