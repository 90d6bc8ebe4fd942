//! Indicator engine — pure functions over an ordered price window.
//!
//! Every function is deterministic and side-effect free. Insufficient data is
//! not an error: each indicator returns its zero sentinel when the window is
//! shorter than its period, and callers treat 0 as "not yet computable". Only
//! an empty price slice is malformed input (`IndicatorError::EmptyInput`).

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger, BollingerBands};
pub use ema::ema;
pub use macd::{macd, MacdValue};
pub use rsi::rsi;
pub use sma::sma;

use crate::domain::StrategyParameters;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All indicator values for one bar, computed over its trailing price window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub sma_short: f64,
    pub sma_long: f64,
    pub rsi: f64,
    pub macd: MacdValue,
    pub bollinger: BollingerBands,
}

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("price series is empty")]
    EmptyInput,
}

impl IndicatorSet {
    /// Compute the full indicator set over a price window.
    ///
    /// The window is the trailing slice of prices ending at the bar under
    /// evaluation; `params.warmup_window()` prices make every field computable.
    pub fn compute(
        prices: &[f64],
        params: &StrategyParameters,
    ) -> Result<IndicatorSet, IndicatorError> {
        if prices.is_empty() {
            return Err(IndicatorError::EmptyInput);
        }
        Ok(IndicatorSet {
            sma_short: sma(prices, params.sma_short),
            sma_long: sma(prices, params.sma_long),
            rsi: rsi(prices, params.rsi_period),
            macd: macd(prices, params.macd_fast, params.macd_slow, params.macd_signal),
            bollinger: bollinger(prices, params.bollinger_period, params.bollinger_std_dev),
        })
    }
}

/// Precompute one `IndicatorSet` per bar from the warmup index onward.
///
/// Entry `k` of the result is the set for bar `k + warmup - 1`, computed over
/// the `warmup` prices ending at that bar. Returns an empty vector when the
/// series is shorter than the warmup window.
pub fn compute_series(
    prices: &[f64],
    params: &StrategyParameters,
) -> Result<Vec<IndicatorSet>, IndicatorError> {
    if prices.is_empty() {
        return Err(IndicatorError::EmptyInput);
    }
    let warmup = params.warmup_window();
    if prices.len() < warmup {
        return Ok(Vec::new());
    }
    let mut sets = Vec::with_capacity(prices.len() - warmup + 1);
    for end in (warmup - 1)..prices.len() {
        sets.push(IndicatorSet::compute(
            &prices[end + 1 - warmup..=end],
            params,
        )?);
    }
    Ok(sets)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
