// =============================================================================
// Average True Range (ATR) — Wilder's Smoothing
// =============================================================================
//
// True Range from the second bar onward:
//   TR = max(high - low, |high - prev_close|, |low - prev_close|)
//
// ATR_0 = simple mean of the first `period` TR values, then
// ATR_t = (ATR_{t-1} * (period - 1) + TR_t) / period — the same Wilder
// update the RSI uses for its averages.
// =============================================================================

use crate::indicators::IndicatorPoint;
use crate::market_data::PriceBar;

/// Compute the ATR series for `bars` and look-back `period`.
///
/// The first point lands at bar index `period` (TR needs a previous bar,
/// and the seed consumes `period` TR values).
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `bars.len() < period + 1` => empty vec
/// - A non-finite true range anywhere is a hard stop: empty vec. ATR has no
///   partial-window tolerance; a broken range poisons the smoothed average.
pub fn calculate_atr(bars: &[PriceBar], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || bars.len() < period + 1 {
        return Vec::new();
    }

    // --- True range per consecutive pair -------------------------------------
    let mut tr_values = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let high = bars[i].high;
        let low = bars[i].low;
        let prev_close = bars[i - 1].close;

        // f64::max would silently drop a NaN operand, so check the inputs
        // rather than the result.
        if !high.is_finite() || !low.is_finite() || !prev_close.is_finite() {
            return Vec::new();
        }

        let hl = high - low;
        let hc = (high - prev_close).abs();
        let lc = (low - prev_close).abs();

        tr_values.push(hl.max(hc).max(lc));
    }

    // --- Seed with the simple mean of the first `period` TRs -----------------
    let seed = tr_values[..period].iter().sum::<f64>() / period as f64;

    let mut result = Vec::with_capacity(tr_values.len() - period + 1);
    result.push(IndicatorPoint::simple(bars[period].timestamp, seed));

    // --- Wilder smoothing ----------------------------------------------------
    let period_f = period as f64;
    let mut atr = seed;
    for (i, &tr) in tr_values.iter().enumerate().skip(period) {
        atr = (atr * (period_f - 1.0) + tr) / period_f;
        result.push(IndicatorPoint::simple(bars[i + 1].timestamp, atr));
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn bar(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
        PriceBar {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    fn drifting_bars(count: usize, spread: f64) -> Vec<PriceBar> {
        (0..count)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.1;
                bar(i as i64 * 86_400_000, base, base + spread, base - spread, base)
            })
            .collect()
    }

    #[test]
    fn atr_empty_input() {
        assert!(calculate_atr(&[], 14).is_empty());
    }

    #[test]
    fn atr_period_zero() {
        assert!(calculate_atr(&drifting_bars(20, 5.0), 0).is_empty());
    }

    #[test]
    fn atr_insufficient_data() {
        // period + 1 = 15 bars required, only 10 present.
        assert!(calculate_atr(&drifting_bars(10, 5.0), 14).is_empty());
    }

    #[test]
    fn atr_first_point_lands_at_index_period() {
        let bars = drifting_bars(20, 5.0);
        let atr = calculate_atr(&bars, 14);
        assert_eq!(atr.len(), 6); // indices 14..19
        assert_eq!(atr[0].timestamp, bars[14].timestamp);
    }

    #[test]
    fn atr_constant_range_converges() {
        // Constant H-L of 10 with a tiny drift: ATR stays near 10.
        let atr = calculate_atr(&drifting_bars(30, 5.0), 14);
        for point in &atr {
            assert!(
                (point.value - 10.0).abs() < 1.0,
                "expected ATR near 10.0, got {}",
                point.value
            );
        }
    }

    #[test]
    fn atr_gap_uses_prev_close() {
        // Gap up: |high - prev_close| dominates high - low.
        let bars = vec![
            bar(0, 100.0, 105.0, 95.0, 95.0),
            bar(1, 110.0, 115.0, 108.0, 112.0), // TR = |115 - 95| = 20
            bar(2, 112.0, 118.0, 110.0, 115.0),
            bar(3, 115.0, 120.0, 113.0, 118.0),
        ];
        let atr = calculate_atr(&bars, 3);
        assert_eq!(atr.len(), 1);
        assert!(atr[0].value > 7.0, "ATR should reflect the gap, got {}", atr[0].value);
    }

    #[test]
    fn atr_wilder_update() {
        let bars = drifting_bars(6, 2.0);
        let atr = calculate_atr(&bars, 3);
        assert_eq!(atr.len(), 3);
        // Constant TR (H-L = 4 dominates the small drift): seed = 4 and the
        // Wilder update keeps it there.
        for point in &atr {
            assert!((point.value - 4.0).abs() < 0.2);
        }
    }

    #[test]
    fn atr_nan_close_is_hard_stop() {
        let mut bars = drifting_bars(20, 5.0);
        bars[10].close = f64::NAN;
        assert!(calculate_atr(&bars, 14).is_empty());
    }
}
