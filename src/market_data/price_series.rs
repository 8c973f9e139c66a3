// =============================================================================
// Price Series — OHLCV bars for a single symbol
// =============================================================================
//
// The primary input of the indicator engine. Bars arrive from the upstream
// market-data API in arbitrary order and occasionally with holes or numeric
// garbage; `PriceSeries::new` normalizes them into a strictly increasing
// timeline. A bar whose close is non-finite is *retained* (the engine's
// per-indicator validity rules decide what to do with it); a bar whose
// high/low envelope is broken is unusable and dropped at ingestion.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single OHLCV price bar. Timestamps are UNIX epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Check the OHLC envelope: `high >= max(open, close)` and
    /// `low <= min(open, close)`.
    ///
    /// Non-finite open/close values are excluded from the envelope check —
    /// a bar may legitimately carry a hole in its close while the rest of
    /// the bar is usable. Non-finite high/low make the whole bar unusable.
    pub fn is_well_formed(&self) -> bool {
        if !self.high.is_finite() || !self.low.is_finite() || self.high < self.low {
            return false;
        }
        for v in [self.open, self.close] {
            if v.is_finite() && (v > self.high || v < self.low) {
                return false;
            }
        }
        true
    }
}

/// Ordered OHLCV series for one symbol at one interval.
///
/// Invariant: `bars` is strictly increasing in timestamp. Construct through
/// [`PriceSeries::new`], which sorts and deduplicates; never push into `bars`
/// directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub interval: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_refreshed: Option<String>,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a normalized series from possibly unordered bars.
    ///
    /// * Bars failing the OHLC envelope check are dropped (with a warning).
    /// * Remaining bars are sorted by timestamp.
    /// * Duplicate timestamps keep the *last* occurrence (upstream sources
    ///   re-send the most recent bar when it is revised).
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        let symbol = symbol.into();
        let interval = interval.into();

        let total = bars.len();
        let mut bars: Vec<PriceBar> = bars.into_iter().filter(PriceBar::is_well_formed).collect();
        let dropped = total - bars.len();
        if dropped > 0 {
            warn!(
                symbol = %symbol,
                interval = %interval,
                dropped,
                "dropped malformed price bars during normalization"
            );
        }

        bars.sort_by_key(|b| b.timestamp);
        // Keep the last bar for each timestamp. After a stable sort equal
        // timestamps preserve input order, so reverse-dedup-reverse keeps
        // the later occurrence.
        bars.reverse();
        bars.dedup_by_key(|b| b.timestamp);
        bars.reverse();

        Self {
            symbol,
            interval,
            last_refreshed: None,
            bars,
        }
    }

    pub fn with_last_refreshed(mut self, last_refreshed: impl Into<String>) -> Self {
        self.last_refreshed = Some(last_refreshed.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in timestamp order (holes included as-is).
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(timestamp: i64, close: f64) -> PriceBar {
        PriceBar {
            timestamp,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn new_sorts_bars_by_timestamp() {
        let series = PriceSeries::new("AAPL", "daily", vec![bar(3, 30.0), bar(1, 10.0), bar(2, 20.0)]);
        let stamps: Vec<i64> = series.bars.iter().map(|b| b.timestamp).collect();
        assert_eq!(stamps, vec![1, 2, 3]);
    }

    #[test]
    fn new_keeps_last_duplicate() {
        let series = PriceSeries::new("AAPL", "daily", vec![bar(1, 10.0), bar(2, 20.0), bar(2, 25.0)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[1].close, 25.0);
    }

    #[test]
    fn new_drops_broken_envelope() {
        let mut broken = bar(2, 20.0);
        broken.high = broken.low - 5.0; // high below low
        let series = PriceSeries::new("AAPL", "daily", vec![bar(1, 10.0), broken]);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn nan_close_is_retained() {
        // A hole in the close is not grounds for dropping the bar.
        let mut holed = bar(2, 20.0);
        holed.close = f64::NAN;
        let series = PriceSeries::new("AAPL", "daily", vec![bar(1, 10.0), holed]);
        assert_eq!(series.len(), 2);
        assert!(series.bars[1].close.is_nan());
    }

    #[test]
    fn nan_high_is_dropped() {
        let mut broken = bar(2, 20.0);
        broken.high = f64::NAN;
        let series = PriceSeries::new("AAPL", "daily", vec![bar(1, 10.0), broken]);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn close_outside_envelope_is_dropped() {
        let mut broken = bar(2, 20.0);
        broken.close = broken.high + 10.0;
        let series = PriceSeries::new("AAPL", "daily", vec![bar(1, 10.0), broken]);
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn closes_preserve_order() {
        let series = PriceSeries::new("AAPL", "daily", vec![bar(2, 20.0), bar(1, 10.0)]);
        assert_eq!(series.closes(), vec![10.0, 20.0]);
    }
}
