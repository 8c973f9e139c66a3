pub mod price_series;

// Re-export the bar types for convenient access (e.g. `use crate::market_data::PriceBar`).
pub use price_series::{PriceBar, PriceSeries};
