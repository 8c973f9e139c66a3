// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the technical indicators served
// by the charting API.  Every computation takes a slice of price bars plus a
// parameter struct and returns a `Vec<IndicatorPoint>`; insufficient input
// always yields an empty vector, never an error.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::market_data::PriceBar;

// =============================================================================
// IndicatorKind
// =============================================================================

/// The indicator families the engine can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Sma,
    Ema,
    Rsi,
    Macd,
    Bollinger,
    Atr,
}

impl IndicatorKind {
    /// All indicator kinds, in dashboard display order.
    pub const ALL: [IndicatorKind; 6] = [
        Self::Sma,
        Self::Ema,
        Self::Rsi,
        Self::Macd,
        Self::Bollinger,
        Self::Atr,
    ];

    /// Parse a dashboard / query-string identifier. Accepts both the wire id
    /// (`bb`) and the long form (`bollinger`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Some(Self::Sma),
            "ema" => Some(Self::Ema),
            "rsi" => Some(Self::Rsi),
            "macd" => Some(Self::Macd),
            "bb" | "bollinger" => Some(Self::Bollinger),
            "atr" => Some(Self::Atr),
            _ => None,
        }
    }

    /// Identifier used when talking to the upstream indicator API.
    pub fn wire_id(&self) -> &'static str {
        match self {
            Self::Sma => "sma",
            Self::Ema => "ema",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::Bollinger => "bb",
            Self::Atr => "atr",
        }
    }

    /// Whether the upstream API can compute this indicator server-side.
    /// ATR has no upstream endpoint and is always computed locally.
    pub fn has_remote_source(&self) -> bool {
        !matches!(self, Self::Atr)
    }

    /// Conventional default look-back period for this indicator.
    pub fn default_period(&self) -> usize {
        match self {
            Self::Rsi | Self::Atr => 14,
            _ => 20,
        }
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Sma => "SMA",
            Self::Ema => "EMA",
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::Bollinger => "Bollinger",
            Self::Atr => "ATR",
        };
        write!(f, "{label}")
    }
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Single configuration struct shared by every indicator computation.
///
/// One entry point with named fields — callers fill in what their indicator
/// uses and leave the rest at defaults. `IndicatorParams::for_kind` applies
/// the conventional default period per indicator family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Look-back window for SMA / EMA / RSI / Bollinger / ATR.
    #[serde(default = "default_period")]
    pub period: usize,

    /// MACD fast EMA period.
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,

    /// MACD slow EMA period.
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,

    /// MACD signal EMA period.
    #[serde(default = "default_signal_period")]
    pub signal_period: usize,

    /// Bollinger band width in standard deviations.
    #[serde(default = "default_std_dev_multiplier")]
    pub std_dev_multiplier: f64,
}

fn default_period() -> usize {
    20
}

fn default_fast_period() -> usize {
    12
}

fn default_slow_period() -> usize {
    26
}

fn default_signal_period() -> usize {
    9
}

fn default_std_dev_multiplier() -> f64 {
    2.0
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            period: default_period(),
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            signal_period: default_signal_period(),
            std_dev_multiplier: default_std_dev_multiplier(),
        }
    }
}

impl IndicatorParams {
    /// Defaults with the conventional period for `kind` (14 for RSI/ATR,
    /// 20 otherwise).
    pub fn for_kind(kind: IndicatorKind) -> Self {
        Self {
            period: kind.default_period(),
            ..Self::default()
        }
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }
}

// =============================================================================
// IndicatorPoint
// =============================================================================

/// One computed indicator value at one timestamp.
///
/// `auxiliary` carries companion values for multi-valued indicators:
/// `signal` / `histogram` for MACD, `upper` / `lower` for Bollinger Bands.
/// It is empty for single-valued indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub timestamp: i64,
    pub value: f64,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub auxiliary: HashMap<String, f64>,
}

impl IndicatorPoint {
    pub fn simple(timestamp: i64, value: f64) -> Self {
        Self {
            timestamp,
            value,
            auxiliary: HashMap::new(),
        }
    }

    pub fn with_aux(timestamp: i64, value: f64, aux: &[(&str, f64)]) -> Self {
        Self {
            timestamp,
            value,
            auxiliary: aux.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    pub fn aux(&self, key: &str) -> Option<f64> {
        self.auxiliary.get(key).copied()
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Compute the series for `kind` over `bars` — the single local entry point
/// used by the chart service's fallback path.
pub fn compute(kind: IndicatorKind, bars: &[PriceBar], params: &IndicatorParams) -> Vec<IndicatorPoint> {
    match kind {
        IndicatorKind::Sma => sma::calculate_sma(bars, params.period),
        IndicatorKind::Ema => ema::calculate_ema(bars, params.period),
        IndicatorKind::Rsi => rsi::calculate_rsi(bars, params.period),
        IndicatorKind::Macd => macd::calculate_macd(
            bars,
            params.fast_period,
            params.slow_period,
            params.signal_period,
        ),
        IndicatorKind::Bollinger => {
            bollinger::calculate_bollinger(bars, params.period, params.std_dev_multiplier)
        }
        IndicatorKind::Atr => atr::calculate_atr(bars, params.period),
    }
}
