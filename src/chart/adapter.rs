// =============================================================================
// Indicator Data Adapter — normalizing upstream indicator payloads
// =============================================================================
//
// The upstream API has grown three encodings for an indicator point:
//
//   [timestamp, value]                    — ordered pair
//   { "timestamp": ..., "value": ... }    — object, epoch or string timestamp
//   { "date": "...", "value": ... }       — object, date-keyed
//
// plus numeric fields that may arrive as JSON strings. This module folds all
// of them into `IndicatorPoint`s. A point matching none of the shapes is
// dropped silently and the rest of the series is still returned — partial
// results beat total failure. A payload whose overall *shape* is wrong
// (missing sub-series, empty arrays, not an array at all) is unusable and
// reported as `None` so the caller can fall back to local computation.
// =============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

use crate::indicators::{IndicatorKind, IndicatorPoint};

/// Adapt a raw upstream payload for `kind` into normalized points.
///
/// Returns `None` when the payload shape is not usable for this indicator —
/// the per-indicator fallback trigger. Individual malformed points inside a
/// well-shaped payload are dropped, never fatal.
pub fn adapt_payload(kind: IndicatorKind, payload: &Value) -> Option<Vec<IndicatorPoint>> {
    match kind {
        IndicatorKind::Sma | IndicatorKind::Ema | IndicatorKind::Rsi | IndicatorKind::Atr => {
            let points = adapt_series(payload)?;
            if points.is_empty() {
                return None;
            }
            Some(points)
        }
        IndicatorKind::Macd => {
            let macd = adapt_series(payload.get("macdLine")?)?;
            let signal = adapt_series(payload.get("signalLine")?)?;
            let histogram = adapt_series(payload.get("histogram")?)?;
            if macd.is_empty() || signal.is_empty() || histogram.is_empty() {
                return None;
            }

            // Pair index-wise; unmatched trailing points are dropped so the
            // three series stay aligned 1:1.
            let points: Vec<IndicatorPoint> = macd
                .iter()
                .zip(&signal)
                .zip(&histogram)
                .map(|((m, s), h)| {
                    IndicatorPoint::with_aux(
                        m.timestamp,
                        m.value,
                        &[("signal", s.value), ("histogram", h.value)],
                    )
                })
                .collect();
            Some(points)
        }
        IndicatorKind::Bollinger => {
            let upper = adapt_series(payload.get("upperBand")?)?;
            let middle = adapt_series(payload.get("middleBand")?)?;
            let lower = adapt_series(payload.get("lowerBand")?)?;
            if upper.is_empty() || middle.is_empty() || lower.is_empty() {
                return None;
            }

            let points: Vec<IndicatorPoint> = middle
                .iter()
                .zip(&upper)
                .zip(&lower)
                .map(|((m, u), l)| {
                    IndicatorPoint::with_aux(
                        m.timestamp,
                        m.value,
                        &[("upper", u.value), ("lower", l.value)],
                    )
                })
                .collect();
            Some(points)
        }
    }
}

/// Adapt one array of points in any mix of the three recognized shapes.
///
/// `None` when `value` is not an array; malformed entries inside the array
/// are dropped with a debug event.
pub fn adapt_series(value: &Value) -> Option<Vec<IndicatorPoint>> {
    let raw = value.as_array()?;
    let mut points = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for entry in raw {
        match adapt_point(entry) {
            Some((timestamp, value)) => points.push(IndicatorPoint::simple(timestamp, value)),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = points.len(), "dropped unrecognized indicator points");
    }
    Some(points)
}

/// Normalize a single point in any of the three shapes.
fn adapt_point(entry: &Value) -> Option<(i64, f64)> {
    // Shape 1: ordered pair [timestamp, value].
    if let Some(pair) = entry.as_array() {
        if pair.len() < 2 {
            return None;
        }
        return Some((parse_timestamp(&pair[0])?, parse_f64(&pair[1])?));
    }

    // Shapes 2 and 3: keyed objects.
    let obj = entry.as_object()?;
    let ts_field = obj.get("timestamp").or_else(|| obj.get("date"))?;
    let value_field = obj.get("value")?;
    Some((parse_timestamp(ts_field)?, parse_f64(value_field)?))
}

/// Parse a timestamp field: numeric values are already epoch milliseconds;
/// text is parsed as RFC 3339, `YYYY-MM-DD HH:MM:SS`, or a bare date
/// (UTC midnight).
pub(crate) fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

pub(crate) fn parse_timestamp_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }
    None
}

/// Parse a numeric field that may be a JSON number or a numeric string.
/// Non-finite results are rejected.
pub(crate) fn parse_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}
