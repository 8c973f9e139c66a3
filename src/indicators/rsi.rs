// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — per-bar gain = max(0, close_i - close_{i-1}),
//          loss = max(0, close_{i-1} - close_i).
// Step 2 — seed average gain / loss with the simple mean of the first
//          `period` deltas.
// Step 3 — Wilder smoothing afterwards:
//            avg = (avg * (period - 1) + new) / period
// Step 4 — RS = avg_gain / avg_loss,  RSI = 100 - 100 / (1 + RS).
//
// A zero average loss is substituted with a small epsilon so the division
// stays defined; the output is clamped to [0, 100] defensively even though
// the formula already bounds it.
// =============================================================================

use crate::indicators::IndicatorPoint;
use crate::market_data::PriceBar;

/// Stand-in for a zero average loss to keep RS defined.
const ZERO_LOSS_EPSILON: f64 = 0.001;

/// Compute the RSI series for `bars` and look-back `period`.
///
/// The first point lands at bar index `period` (the first `period` deltas
/// are consumed by the seed averages).
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - `bars.len() < period + 1` => empty vec (need `period` deltas)
/// - A non-finite delta inside the seed window => empty vec; after the seed
///   it stops the series at that bar (a broken delta poisons everything
///   downstream of it).
pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> Vec<IndicatorPoint> {
    if period == 0 || bars.len() < period + 1 {
        return Vec::new();
    }

    // --- Seed averages from the first `period` deltas ------------------------
    let mut sum_gain = 0.0;
    let mut sum_loss = 0.0;
    for i in 1..=period {
        let delta = bars[i].close - bars[i - 1].close;
        if !delta.is_finite() {
            return Vec::new();
        }
        if delta > 0.0 {
            sum_gain += delta;
        } else {
            sum_loss += delta.abs();
        }
    }

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    let mut result = Vec::with_capacity(bars.len() - period);
    result.push(IndicatorPoint::simple(
        bars[period].timestamp,
        rsi_value(avg_gain, avg_loss),
    ));

    // --- Wilder smoothing for subsequent bars --------------------------------
    for i in (period + 1)..bars.len() {
        let delta = bars[i].close - bars[i - 1].close;
        if !delta.is_finite() {
            break;
        }
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        result.push(IndicatorPoint::simple(
            bars[i].timestamp,
            rsi_value(avg_gain, avg_loss),
        ));
    }

    result
}

/// RS -> RSI with the zero-loss substitution and a defensive clamp.
fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let divisor = if avg_loss == 0.0 { ZERO_LOSS_EPSILON } else { avg_loss };
    let rs = avg_gain / divisor;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}
