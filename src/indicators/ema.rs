// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = (close_t - EMA_{t-1}) * multiplier + EMA_{t-1}
//
// The first value is seeded with the SMA of the first `period` closes and
// emitted at index `period - 1`. Every later bar emits exactly one point.
// The seed window carries the same 80%-finite requirement as the SMA; after
// the seed there is no validity gate — a bar with no usable close simply
// contributes no information and the EMA holds its previous value.
// =============================================================================

use crate::indicators::{sma, IndicatorPoint};
use crate::market_data::PriceBar;

/// Compute the EMA series for `bars` and look-back `period`.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `bars.len() < period` => empty vec
/// - Seed window below 80% finite closes => empty vec (the whole series
///   fails; there is nothing sound to seed from).
pub fn calculate_ema(bars: &[PriceBar], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || bars.len() < period {
        return Vec::new();
    }

    let seed = match sma::window_mean(&bars[..period]) {
        Some(mean) => mean,
        None => return Vec::new(),
    };

    let multiplier = 2.0 / (period as f64 + 1.0);

    let mut result = Vec::with_capacity(bars.len() - period + 1);
    result.push(IndicatorPoint::simple(bars[period - 1].timestamp, seed));

    let mut prev = seed;
    for bar in &bars[period..] {
        if bar.close.is_finite() {
            prev = (bar.close - prev) * multiplier + prev;
        }
        result.push(IndicatorPoint::simple(bar.timestamp, prev));
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::sma::calculate_sma;

    fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar {
                timestamp: i as i64 * 86_400_000,
                open: c,
                high: if c.is_finite() { c + 1.0 } else { 101.0 },
                low: if c.is_finite() { c - 1.0 } else { 99.0 },
                close: c,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert!(calculate_ema(&bars_from_closes(&[1.0, 2.0, 3.0]), 0).is_empty());
    }

    #[test]
    fn ema_insufficient_data() {
        assert!(calculate_ema(&bars_from_closes(&[1.0, 2.0]), 5).is_empty());
    }

    #[test]
    fn ema_seed_equals_sma() {
        // The value at index period-1 must equal SMA(period) there.
        let bars = bars_from_closes(&[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        let ema = calculate_ema(&bars, 4);
        let sma = calculate_sma(&bars, 4);
        assert_eq!(ema[0].timestamp, sma[0].timestamp);
        assert!((ema[0].value - sma[0].value).abs() < 1e-10);
    }

    #[test]
    fn ema_known_recurrence() {
        // EMA(5) over the reference closes: seed = SMA of first 5 = 12.2,
        // multiplier = 2/6 = 1/3, then the recurrence exactly.
        let closes = [
            10.0, 12.0, 11.0, 13.0, 15.0, 14.0, 16.0, 18.0, 17.0, 19.0, 20.0, 22.0, 21.0, 23.0,
            25.0,
        ];
        let bars = bars_from_closes(&closes);
        let ema = calculate_ema(&bars, 5);
        assert_eq!(ema.len(), 11); // indices 4..14

        assert!((ema[0].value - 12.2).abs() < 1e-10);

        let multiplier = 2.0 / 6.0;
        let mut expected = 12.2;
        for (point, &close) in ema[1..].iter().zip(&closes[5..]) {
            expected = (close - expected) * multiplier + expected;
            assert!(
                (point.value - expected).abs() < 1e-10,
                "got {}, expected {expected}",
                point.value
            );
        }
    }

    #[test]
    fn ema_constant_series_stays_constant() {
        let bars = bars_from_closes(&[100.0; 30]);
        let ema = calculate_ema(&bars, 14);
        assert_eq!(ema.len(), 17);
        for point in &ema {
            assert!((point.value - 100.0).abs() < 1e-10);
        }
    }

    #[test]
    fn ema_holds_value_over_holes() {
        // After the seed there is no skip policy: a NaN close leaves the EMA
        // unchanged and the bar still emits a point.
        let closes = [10.0, 10.0, 10.0, f64::NAN, 16.0];
        let bars = bars_from_closes(&closes);
        let ema = calculate_ema(&bars, 3);
        assert_eq!(ema.len(), 3);
        assert!((ema[0].value - 10.0).abs() < 1e-10);
        assert!((ema[1].value - 10.0).abs() < 1e-10); // held through the hole
        assert!((ema[2].value - 13.0).abs() < 1e-10); // (16-10)*0.5 + 10
    }

    #[test]
    fn ema_unseedable_window_fails_whole_series() {
        // Two holes in a 5-bar seed window: 60% valid, below the 80% floor.
        let closes = [10.0, f64::NAN, f64::NAN, 10.0, 10.0, 11.0, 12.0];
        assert!(calculate_ema(&bars_from_closes(&closes), 5).is_empty());
    }
}
