// =============================================================================
// Bollinger Bands
// =============================================================================
//
// middle = SMA(period), upper/lower = middle ± k·σ, where σ is the
// *population* standard deviation of the window closes (divide by the count
// of finite closes, not count - 1).
//
// Missing-data tolerance matches the SMA: a window below 80% finite closes
// emits no point; the mean and deviation are taken over the finite subset.
// =============================================================================

use crate::indicators::{sma::MIN_VALID_FRACTION, IndicatorPoint};
use crate::market_data::PriceBar;

/// Compute Bollinger Bands for `bars`.
///
/// Each point's `value` is the middle band, with `upper` and `lower`
/// carried as auxiliary values.
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `bars.len() < period` => empty vec
/// - A window with fewer than 80% finite closes is skipped.
pub fn calculate_bollinger(bars: &[PriceBar], period: usize, num_std: f64) -> Vec<IndicatorPoint> {
    if period == 0 || bars.len() < period {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(bars.len() - period + 1);
    for i in (period - 1)..bars.len() {
        let window = &bars[i + 1 - period..=i];

        let finite: Vec<f64> = window
            .iter()
            .map(|b| b.close)
            .filter(|c| c.is_finite())
            .collect();
        if (finite.len() as f64) < MIN_VALID_FRACTION * period as f64 {
            continue;
        }

        let count = finite.len() as f64;
        let middle = finite.iter().sum::<f64>() / count;
        let variance = finite.iter().map(|c| (c - middle).powi(2)).sum::<f64>() / count;
        let std_dev = variance.sqrt();

        result.push(IndicatorPoint::with_aux(
            bars[i].timestamp,
            middle,
            &[
                ("upper", middle + num_std * std_dev),
                ("lower", middle - num_std * std_dev),
            ],
        ));
    }

    result
}
