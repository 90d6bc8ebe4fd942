//! MarketDataPoint — the fundamental time-series unit.

use serde::{Deserialize, Serialize};

/// One sampled observation of a symbol's market price.
///
/// The store enforces at most one point per `(symbol, timestamp)`; writing a
/// duplicate is a no-op, not an error. Points are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataPoint {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
}

impl MarketDataPoint {
    /// Basic sanity check: finite, non-negative price and volume.
    pub fn is_sane(&self) -> bool {
        self.price.is_finite() && self.price > 0.0 && self.volume.is_finite() && self.volume >= 0.0
    }
}
