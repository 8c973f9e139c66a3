// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(fast) - EMA(slow), aligned by timestamp
//   signal    = EMA(signal_period) of the macd values, seeded with their
//               simple mean
//   histogram = macd - signal
//
// The slow EMA starts later than the fast one and therefore fixes the
// available timestamp range. Output points carry the macd value with the
// signal and histogram as auxiliary values, so the three derived chart
// series are aligned 1:1 by construction. If fewer than `signal_period`
// macd values exist nothing is emitted at all — silence, not an error.
// =============================================================================

use crate::indicators::{ema, IndicatorPoint};
use crate::market_data::PriceBar;

/// Compute the MACD series for `bars`.
///
/// # Edge cases
/// - any zero period => empty vec
/// - `bars.len() < slow_period` => empty vec (no macd point exists)
/// - fewer than `signal_period` macd points => empty vec (no signal line
///   can be seeded, and the three series must stay aligned)
pub fn calculate_macd(
    bars: &[PriceBar],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Vec<IndicatorPoint> {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 {
        return Vec::new();
    }
    if bars.len() < slow_period {
        return Vec::new();
    }

    let fast_ema = ema::calculate_ema(bars, fast_period);
    let slow_ema = ema::calculate_ema(bars, slow_period);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return Vec::new();
    }

    // --- Align the fast EMA onto the slow EMA's first timestamp --------------
    let offset = match fast_ema
        .iter()
        .position(|p| p.timestamp == slow_ema[0].timestamp)
    {
        Some(idx) => idx,
        None => return Vec::new(),
    };

    let macd_line: Vec<(i64, f64)> = slow_ema
        .iter()
        .zip(&fast_ema[offset..])
        .map(|(slow, fast)| (slow.timestamp, fast.value - slow.value))
        .collect();

    if macd_line.len() < signal_period {
        return Vec::new();
    }

    // --- Signal line: EMA over the macd values, seeded by simple mean --------
    let seed: f64 =
        macd_line[..signal_period].iter().map(|(_, v)| v).sum::<f64>() / signal_period as f64;
    let multiplier = 2.0 / (signal_period as f64 + 1.0);

    let mut result = Vec::with_capacity(macd_line.len() - signal_period + 1);
    let (first_ts, first_macd) = macd_line[signal_period - 1];
    result.push(IndicatorPoint::with_aux(
        first_ts,
        first_macd,
        &[("signal", seed), ("histogram", first_macd - seed)],
    ));

    let mut signal = seed;
    for &(ts, macd) in &macd_line[signal_period..] {
        signal = (macd - signal) * multiplier + signal;
        result.push(IndicatorPoint::with_aux(
            ts,
            macd,
            &[("signal", signal), ("histogram", macd - signal)],
        ));
    }

    result
}
