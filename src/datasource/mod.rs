// =============================================================================
// Data Sources — the core's only inbound dependency boundary
// =============================================================================
//
// Two collaborators feed the chart pipeline:
//
//   * `PriceSource`     — the primary OHLCV series. No fallback exists; a
//                         failure here is surfaced to the caller.
//   * `IndicatorSource` — server-computed indicator payloads, returned raw
//                         for the adapter to normalize. Any failure or
//                         malformed payload means "use local fallback".
//
// Both are traits so the chart service can be driven by in-process fakes in
// tests; production wires in the HTTP implementations below.

pub mod indicator_source;
pub mod price_source;

pub use indicator_source::HttpIndicatorSource;
pub use price_source::HttpPriceSource;

use std::future::Future;

use anyhow::Result;
use serde_json::Value;

use crate::indicators::{IndicatorKind, IndicatorParams};
use crate::market_data::PriceSeries;

/// Parameters of one price-series fetch.
#[derive(Debug, Clone, Default)]
pub struct PriceQuery {
    pub symbol: String,
    pub interval: String,
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Supplier of the primary price series.
pub trait PriceSource: Send + Sync {
    fn fetch(&self, query: &PriceQuery) -> impl Future<Output = Result<PriceSeries>> + Send;
}

/// Supplier of server-computed indicator payloads. The payload shape depends
/// on the indicator id: a single point array for `sma`/`ema`/`rsi`,
/// `{macdLine, signalLine, histogram}` for `macd`, and
/// `{upperBand, middleBand, lowerBand}` for `bb`.
pub trait IndicatorSource: Send + Sync {
    fn fetch(
        &self,
        symbol: &str,
        kind: IndicatorKind,
        params: &IndicatorParams,
    ) -> impl Future<Output = Result<Value>> + Send;
}
