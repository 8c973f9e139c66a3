// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// For every index `i >= period - 1` the SMA is the mean of the closes in the
// trailing `period`-bar window, timestamped at the window's last bar.
//
// Missing-data tolerance: a window is usable when at least 80% of its closes
// are finite; the mean is taken over the finite closes only. A window below
// the threshold emits no point — the rest of the series is unaffected.
// =============================================================================

use crate::indicators::IndicatorPoint;
use crate::market_data::PriceBar;

/// Minimum fraction of finite closes a window must contain to emit a point.
pub(crate) const MIN_VALID_FRACTION: f64 = 0.8;

/// Compute the SMA series for `bars` and look-back `period`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `bars.len() < period` => empty vec
/// - A window with fewer than 80% finite closes is skipped, not an error.
pub fn calculate_sma(bars: &[PriceBar], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || bars.len() < period {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(bars.len() - period + 1);
    for i in (period - 1)..bars.len() {
        let window = &bars[i + 1 - period..=i];
        if let Some(mean) = window_mean(window) {
            result.push(IndicatorPoint::simple(bars[i].timestamp, mean));
        }
    }

    result
}

/// Mean of the finite closes in `window`, or `None` when fewer than 80% of
/// the closes are finite. Shared with the EMA seed and Bollinger middle band.
pub(crate) fn window_mean(window: &[PriceBar]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for bar in window {
        if bar.close.is_finite() {
            sum += bar.close;
            count += 1;
        }
    }

    if (count as f64) < MIN_VALID_FRACTION * window.len() as f64 {
        return None;
    }
    Some(sum / count as f64)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(timestamp: i64, close: f64) -> PriceBar {
        PriceBar {
            timestamp,
            open: close,
            high: if close.is_finite() { close + 1.0 } else { 101.0 },
            low: if close.is_finite() { close - 1.0 } else { 99.0 },
            close,
            volume: 1_000,
        }
    }

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| bar(i as i64 * 86_400_000, c))
            .collect()
    }

    #[test]
    fn sma_empty_input() {
        assert!(calculate_sma(&[], 5).is_empty());
    }

    #[test]
    fn sma_period_zero() {
        assert!(calculate_sma(&bars_from_closes(&[1.0, 2.0, 3.0]), 0).is_empty());
    }

    #[test]
    fn sma_insufficient_data() {
        assert!(calculate_sma(&bars_from_closes(&[1.0, 2.0]), 5).is_empty());
    }

    #[test]
    fn sma_known_values() {
        // 3-period SMA of [1..5]: [2, 3, 4]
        let bars = bars_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let sma = calculate_sma(&bars, 3);
        assert_eq!(sma.len(), 3);
        for (point, expected) in sma.iter().zip([2.0, 3.0, 4.0]) {
            assert!((point.value - expected).abs() < 1e-10);
        }
        // Timestamped at the window's last bar.
        assert_eq!(sma[0].timestamp, bars[2].timestamp);
    }

    #[test]
    fn sma_constant_series() {
        // 30 daily bars of constant close=100, SMA(14) => 17 points, all 100.
        let bars = bars_from_closes(&[100.0; 30]);
        let sma = calculate_sma(&bars, 14);
        assert_eq!(sma.len(), 17);
        for point in &sma {
            assert!((point.value - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn sma_tolerates_sparse_holes() {
        // One NaN close inside a 10-bar window is 90% valid — mean over the
        // finite nine.
        let mut closes = vec![10.0; 10];
        closes[4] = f64::NAN;
        let sma = calculate_sma(&bars_from_closes(&closes), 10);
        assert_eq!(sma.len(), 1);
        assert!((sma[0].value - 10.0).abs() < 1e-10);
    }

    #[test]
    fn sma_skips_windows_below_threshold() {
        // Two NaN closes in a 5-bar window is 60% valid — below 80%, so that
        // window emits nothing while clean windows still do.
        let closes = vec![10.0, f64::NAN, f64::NAN, 10.0, 10.0, 10.0, 10.0, 10.0];
        let sma = calculate_sma(&bars_from_closes(&closes), 5);
        // Windows ending at indices 4 and 5 contain two holes; 6 contains one
        // (80% — allowed); 7 is clean.
        assert_eq!(sma.len(), 2);
    }

    #[test]
    fn window_mean_exact_threshold() {
        // 4 finite of 5 is exactly 80% — allowed.
        let closes = vec![1.0, 2.0, 3.0, 4.0, f64::NAN];
        let mean = window_mean(&bars_from_closes(&closes));
        assert!((mean.unwrap() - 2.5).abs() < 1e-10);
    }
}
