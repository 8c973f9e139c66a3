// =============================================================================
// Chart Bundle — renderer-agnostic output of a chart round
// =============================================================================
//
// Everything the rendering boundary needs for one complete chart: the primary
// price series, the derived indicator series, and the axis layout. A bundle
// is immutable once built; recomputation replaces it wholesale and bumps the
// version, so subscribers watch the version instead of array identity.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::PriceSeries;

/// How the primary price series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Candlestick,
    Line,
    Ohlc,
}

impl Default for ChartType {
    fn default() -> Self {
        Self::Candlestick
    }
}

impl ChartType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "candlestick" => Some(Self::Candlestick),
            "line" => Some(Self::Line),
            "ohlc" => Some(Self::Ohlc),
            _ => None,
        }
    }
}

/// Identity of a chart axis. `Price` always exists; the oscillator axes are
/// allocated per active indicator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisId {
    Price,
    Macd,
    Rsi,
    Atr,
}

/// Where a series' points came from in the per-indicator fallback contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesOrigin {
    /// Supplied by the upstream indicator API.
    Remote,
    /// Computed locally after the upstream fetch failed or was malformed.
    LocalFallback,
}

/// A single-valued point on a line or histogram series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub timestamp: i64,
    pub value: f64,
}

/// A filled-region point pairing an upper and lower band value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPoint {
    pub timestamp: i64,
    pub upper: f64,
    pub lower: f64,
}

/// Typed point payload of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "lowercase")]
pub enum SeriesData {
    Line(Vec<LinePoint>),
    Histogram(Vec<LinePoint>),
    Band(Vec<BandPoint>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            Self::Line(p) | Self::Histogram(p) => p.len(),
            Self::Band(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One named, axis-tagged series in the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub axis: AxisId,
    pub origin: SeriesOrigin,
    #[serde(flatten)]
    pub data: SeriesData,
}

/// Layout descriptor for one axis: relative height and, for bounded
/// oscillators, fixed value bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisDescriptor {
    pub id: AxisId,
    pub height_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bounds: Option<(f64, f64)>,
}

/// The complete output of one chart round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartBundle {
    /// The round sequence number that produced this bundle. Monotonically
    /// increasing; the rendering boundary subscribes to changes of this.
    pub version: u64,
    pub chart_type: ChartType,
    pub price: PriceSeries,
    pub series: Vec<ChartSeries>,
    pub axes: Vec<AxisDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_type_parse() {
        assert_eq!(ChartType::parse("line"), Some(ChartType::Line));
        assert_eq!(ChartType::parse("CANDLESTICK"), Some(ChartType::Candlestick));
        assert_eq!(ChartType::parse("area"), None);
    }

    #[test]
    fn series_data_len() {
        let line = SeriesData::Line(vec![LinePoint { timestamp: 1, value: 2.0 }]);
        assert_eq!(line.len(), 1);
        assert!(!line.is_empty());
        assert!(SeriesData::Band(Vec::new()).is_empty());
    }

    #[test]
    fn series_serializes_with_flattened_kind() {
        let series = ChartSeries {
            name: "SMA(20)".into(),
            axis: AxisId::Price,
            origin: SeriesOrigin::LocalFallback,
            data: SeriesData::Line(vec![LinePoint { timestamp: 1, value: 2.0 }]),
        };
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["kind"], "line");
        assert_eq!(json["axis"], "price");
        assert_eq!(json["origin"], "local_fallback");
        assert_eq!(json["points"][0]["value"], 2.0);
    }
}
