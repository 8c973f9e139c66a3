// =============================================================================
// Chart Series Assembler — axis topology + series merge
// =============================================================================
//
// Takes the primary price series and the per-indicator resolution results
// (remote or locally computed) and produces the renderer-agnostic bundle:
//
//   1. The price axis always exists. Moving averages and Bollinger Bands
//      draw on it; MACD, RSI and ATR each get their own oscillator pane.
//   2. Pane heights depend on how many oscillator families are active:
//      none        -> price 100%
//      one         -> price 75% / 25%
//      two         -> price 65% / 20% / 15%
//      three       -> price 55% / 15% / 15% / 15%
//   3. Bollinger output is split into a middle line plus a filled band
//      region pairing upper/lower values; MACD output is split into its
//      macd line, signal line and histogram, aligned 1:1.
//
// The assembler has no incremental path: every round rebuilds the bundle
// from scratch and stamps it with the round's sequence number.
// =============================================================================

use crate::chart::bundle::{
    AxisDescriptor, AxisId, BandPoint, ChartBundle, ChartSeries, ChartType, LinePoint, SeriesData,
    SeriesOrigin,
};
use crate::indicators::{IndicatorKind, IndicatorParams, IndicatorPoint};
use crate::market_data::PriceSeries;

/// RSI is bounded by construction; its axis is pinned to the full range.
const RSI_BOUNDS: (f64, f64) = (0.0, 100.0);

/// The outcome of resolving one requested indicator: where the points came
/// from and the normalized points themselves.
#[derive(Debug, Clone)]
pub struct ResolvedIndicator {
    pub kind: IndicatorKind,
    pub params: IndicatorParams,
    pub origin: SeriesOrigin,
    pub points: Vec<IndicatorPoint>,
}

/// Oscillator pane for an indicator kind, if it needs one.
fn oscillator_axis(kind: IndicatorKind) -> Option<AxisId> {
    match kind {
        IndicatorKind::Macd => Some(AxisId::Macd),
        IndicatorKind::Rsi => Some(AxisId::Rsi),
        IndicatorKind::Atr => Some(AxisId::Atr),
        IndicatorKind::Sma | IndicatorKind::Ema | IndicatorKind::Bollinger => None,
    }
}

/// Build the axis layout for the active indicator set.
///
/// Oscillator panes appear in fixed display order (MACD, RSI, ATR) no matter
/// the order indicators were requested in.
pub fn layout_axes(active: &[IndicatorKind]) -> Vec<AxisDescriptor> {
    let mut oscillators: Vec<AxisId> = Vec::new();
    for axis in [AxisId::Macd, AxisId::Rsi, AxisId::Atr] {
        if active
            .iter()
            .any(|&kind| oscillator_axis(kind) == Some(axis))
            && !oscillators.contains(&axis)
        {
            oscillators.push(axis);
        }
    }

    let (price_pct, osc_pcts): (f64, &[f64]) = match oscillators.len() {
        0 => (100.0, &[]),
        1 => (75.0, &[25.0]),
        2 => (65.0, &[20.0, 15.0]),
        _ => (55.0, &[15.0, 15.0, 15.0]),
    };

    let mut axes = Vec::with_capacity(oscillators.len() + 1);
    axes.push(AxisDescriptor {
        id: AxisId::Price,
        height_pct: price_pct,
        bounds: None,
    });
    for (axis, &pct) in oscillators.iter().zip(osc_pcts) {
        axes.push(AxisDescriptor {
            id: *axis,
            height_pct: pct,
            bounds: (*axis == AxisId::Rsi).then_some(RSI_BOUNDS),
        });
    }

    axes
}

/// Assemble the final bundle for one chart round.
pub fn assemble(
    price: PriceSeries,
    chart_type: ChartType,
    resolved: &[ResolvedIndicator],
    version: u64,
) -> ChartBundle {
    let active: Vec<IndicatorKind> = resolved.iter().map(|r| r.kind).collect();
    let axes = layout_axes(&active);

    let mut series = Vec::new();
    for indicator in resolved {
        append_series(&mut series, indicator);
    }

    ChartBundle {
        version,
        chart_type,
        price,
        series,
        axes,
    }
}

/// Derive the chart series for one resolved indicator. Indicators that
/// resolved to no points contribute nothing — their pane may still exist,
/// the renderer just has nothing to draw in it.
fn append_series(out: &mut Vec<ChartSeries>, indicator: &ResolvedIndicator) {
    if indicator.points.is_empty() {
        return;
    }
    let origin = indicator.origin;
    let p = &indicator.params;

    match indicator.kind {
        IndicatorKind::Sma | IndicatorKind::Ema => out.push(ChartSeries {
            name: format!("{}({})", indicator.kind, p.period),
            axis: AxisId::Price,
            origin,
            data: SeriesData::Line(line_points(&indicator.points)),
        }),
        IndicatorKind::Rsi => out.push(ChartSeries {
            name: format!("RSI({})", p.period),
            axis: AxisId::Rsi,
            origin,
            data: SeriesData::Line(line_points(&indicator.points)),
        }),
        IndicatorKind::Atr => out.push(ChartSeries {
            name: format!("ATR({})", p.period),
            axis: AxisId::Atr,
            origin,
            data: SeriesData::Line(line_points(&indicator.points)),
        }),
        IndicatorKind::Macd => {
            out.push(ChartSeries {
                name: format!("MACD({},{})", p.fast_period, p.slow_period),
                axis: AxisId::Macd,
                origin,
                data: SeriesData::Line(line_points(&indicator.points)),
            });
            out.push(ChartSeries {
                name: format!("Signal({})", p.signal_period),
                axis: AxisId::Macd,
                origin,
                data: SeriesData::Line(aux_points(&indicator.points, "signal")),
            });
            out.push(ChartSeries {
                name: "Histogram".to_string(),
                axis: AxisId::Macd,
                origin,
                data: SeriesData::Histogram(aux_points(&indicator.points, "histogram")),
            });
        }
        IndicatorKind::Bollinger => {
            out.push(ChartSeries {
                name: format!("Bollinger({})", p.period),
                axis: AxisId::Price,
                origin,
                data: SeriesData::Line(line_points(&indicator.points)),
            });
            out.push(ChartSeries {
                name: format!("Bollinger({}) band", p.period),
                axis: AxisId::Price,
                origin,
                data: SeriesData::Band(band_points(&indicator.points)),
            });
        }
    }
}

fn line_points(points: &[IndicatorPoint]) -> Vec<LinePoint> {
    points
        .iter()
        .map(|p| LinePoint {
            timestamp: p.timestamp,
            value: p.value,
        })
        .collect()
}

/// Project an auxiliary value into a line; points lacking the key are
/// skipped.
fn aux_points(points: &[IndicatorPoint], key: &str) -> Vec<LinePoint> {
    points
        .iter()
        .filter_map(|p| {
            p.aux(key).map(|value| LinePoint {
                timestamp: p.timestamp,
                value,
            })
        })
        .collect()
}

/// Pair each upper-band value with the lower-band value at the same index.
/// Points missing either side are dropped rather than failing the series.
fn band_points(points: &[IndicatorPoint]) -> Vec<BandPoint> {
    points
        .iter()
        .filter_map(|p| {
            let upper = p.aux("upper")?;
            let lower = p.aux("lower")?;
            Some(BandPoint {
                timestamp: p.timestamp,
                upper,
                lower,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators;
    use crate::market_data::PriceBar;

    fn sample_series(count: usize) -> PriceSeries {
        let bars: Vec<PriceBar> = (0..count)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.4).sin() * 5.0;
                PriceBar {
                    timestamp: i as i64 * 86_400_000,
                    open: close - 0.5,
                    high: close + 2.0,
                    low: close - 2.0,
                    close,
                    volume: 10_000,
                }
            })
            .collect();
        PriceSeries::new("AAPL", "daily", bars)
    }

    fn resolve_local(kind: IndicatorKind, series: &PriceSeries) -> ResolvedIndicator {
        let params = IndicatorParams::for_kind(kind);
        ResolvedIndicator {
            kind,
            params,
            origin: SeriesOrigin::LocalFallback,
            points: indicators::compute(kind, &series.bars, &params),
        }
    }

    #[test]
    fn price_axis_alone_takes_full_height() {
        let axes = layout_axes(&[IndicatorKind::Sma, IndicatorKind::Bollinger]);
        assert_eq!(axes.len(), 1);
        assert_eq!(axes[0].id, AxisId::Price);
        assert_eq!(axes[0].height_pct, 100.0);
    }

    #[test]
    fn single_oscillator_split() {
        let axes = layout_axes(&[IndicatorKind::Rsi]);
        assert_eq!(axes.len(), 2);
        assert_eq!(axes[0].height_pct, 75.0);
        assert_eq!(axes[1].id, AxisId::Rsi);
        assert_eq!(axes[1].height_pct, 25.0);
        assert_eq!(axes[1].bounds, Some((0.0, 100.0)));
    }

    #[test]
    fn macd_plus_rsi_axis_layout() {
        // The two-oscillator split: price 65%, MACD 20%, RSI 15% — in fixed
        // display order regardless of request order.
        let axes = layout_axes(&[IndicatorKind::Rsi, IndicatorKind::Macd]);
        assert_eq!(axes.len(), 3);
        assert_eq!(axes[0].id, AxisId::Price);
        assert_eq!(axes[0].height_pct, 65.0);
        assert_eq!(axes[1].id, AxisId::Macd);
        assert_eq!(axes[1].height_pct, 20.0);
        assert_eq!(axes[2].id, AxisId::Rsi);
        assert_eq!(axes[2].height_pct, 15.0);
    }

    #[test]
    fn three_oscillators_split() {
        let axes = layout_axes(&[IndicatorKind::Macd, IndicatorKind::Rsi, IndicatorKind::Atr]);
        assert_eq!(axes.len(), 4);
        let total: f64 = axes.iter().map(|a| a.height_pct).sum();
        assert!((total - 100.0).abs() < 1e-10);
        assert_eq!(axes[0].height_pct, 55.0);
    }

    #[test]
    fn heights_always_sum_to_hundred() {
        for active in [
            vec![],
            vec![IndicatorKind::Sma],
            vec![IndicatorKind::Macd],
            vec![IndicatorKind::Macd, IndicatorKind::Rsi],
            vec![IndicatorKind::Macd, IndicatorKind::Rsi, IndicatorKind::Atr],
        ] {
            let total: f64 = layout_axes(&active).iter().map(|a| a.height_pct).sum();
            assert!((total - 100.0).abs() < 1e-10, "active={active:?}");
        }
    }

    #[test]
    fn macd_expands_to_three_aligned_series() {
        let series = sample_series(80);
        let bundle = assemble(
            series.clone(),
            ChartType::Candlestick,
            &[resolve_local(IndicatorKind::Macd, &series)],
            1,
        );
        assert_eq!(bundle.series.len(), 3);
        let (macd, signal, histogram) = (&bundle.series[0], &bundle.series[1], &bundle.series[2]);
        assert!(macd.name.starts_with("MACD"));
        assert!(matches!(histogram.data, SeriesData::Histogram(_)));

        let (SeriesData::Line(m), SeriesData::Line(s), SeriesData::Histogram(h)) =
            (&macd.data, &signal.data, &histogram.data)
        else {
            panic!("unexpected series data kinds");
        };
        assert_eq!(m.len(), s.len());
        assert_eq!(m.len(), h.len());
        for ((mp, sp), hp) in m.iter().zip(s).zip(h) {
            assert_eq!(mp.timestamp, sp.timestamp);
            assert!((hp.value - (mp.value - sp.value)).abs() < 1e-10);
        }
    }

    #[test]
    fn bollinger_produces_middle_line_and_band() {
        let series = sample_series(40);
        let bundle = assemble(
            series.clone(),
            ChartType::Line,
            &[resolve_local(IndicatorKind::Bollinger, &series)],
            1,
        );
        assert_eq!(bundle.series.len(), 2);
        assert_eq!(bundle.series[0].axis, AxisId::Price);
        let SeriesData::Band(band) = &bundle.series[1].data else {
            panic!("expected band series");
        };
        assert!(!band.is_empty());
        for point in band {
            assert!(point.upper >= point.lower);
        }
        // Bands never allocate an oscillator pane.
        assert_eq!(bundle.axes.len(), 1);
    }

    #[test]
    fn band_pairing_drops_one_sided_points() {
        let points = vec![
            IndicatorPoint::with_aux(1, 10.0, &[("upper", 12.0), ("lower", 8.0)]),
            IndicatorPoint::with_aux(2, 11.0, &[("upper", 13.0)]), // lower missing
            IndicatorPoint::with_aux(3, 12.0, &[("upper", 14.0), ("lower", 10.0)]),
        ];
        let band = band_points(&points);
        assert_eq!(band.len(), 2);
        assert_eq!(band[1].timestamp, 3);
    }

    #[test]
    fn empty_indicator_contributes_no_series_but_keeps_pane() {
        // Ten bars cannot seed a MACD(12,26,9); the pane is allocated but
        // nothing is drawn in it.
        let series = sample_series(10);
        let bundle = assemble(
            series.clone(),
            ChartType::Candlestick,
            &[resolve_local(IndicatorKind::Macd, &series)],
            1,
        );
        assert!(bundle.series.is_empty());
        assert_eq!(bundle.axes.len(), 2);
    }

    #[test]
    fn bundle_carries_round_version() {
        let series = sample_series(5);
        let bundle = assemble(series, ChartType::Ohlc, &[], 42);
        assert_eq!(bundle.version, 42);
        assert_eq!(bundle.chart_type, ChartType::Ohlc);
    }
}
