//! Moving Average Convergence Divergence (MACD).
//!
//! MACD line = EMA(fast) - EMA(slow). The signal line is the EMA (signal
//! period) of the series formed by appending the MACD value to all-but-last
//! input prices. That recomputation is unusual but deterministic; downstream
//! parity tests depend on it, so it is preserved exactly.

use super::ema::ema;
use serde::{Deserialize, Serialize};

/// MACD line, signal line and their difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD over the full price window.
pub fn macd(prices: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdValue {
    let macd_line = ema(prices, fast) - ema(prices, slow);

    let mut shifted: Vec<f64> = prices[..prices.len().saturating_sub(1)].to_vec();
    shifted.push(macd_line);
    let signal = ema(&shifted, signal_period);

    MacdValue {
        macd: macd_line,
        signal,
        histogram: macd_line - signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn macd_constant_series_parity() {
        // Both EMAs equal the constant, so the MACD line is 0. The signal
        // series is 29 prices of 100 with a trailing 0:
        // seed over first 9 = 100, smoothing stays at 100 until the final 0:
        // (0 - 100) * (2/10) + 100 = 80.
        let prices = [100.0; 30];
        let v = macd(&prices, 12, 26, 9);
        assert_approx(v.macd, 0.0, 1e-9);
        assert_approx(v.signal, 80.0, 1e-9);
        assert_approx(v.histogram, -80.0, 1e-9);
    }

    #[test]
    fn macd_insufficient_data_components_are_zero() {
        // Fewer prices than the slow period: slow EMA is 0, so macd = fast EMA.
        let prices = [100.0; 13];
        let v = macd(&prices, 12, 26, 9);
        assert_approx(v.macd, 100.0, 1e-9);
    }

    #[test]
    fn macd_uptrend_line_is_positive() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let v = macd(&prices, 12, 26, 9);
        assert!(v.macd > 0.0, "fast EMA should lead in an uptrend");
    }

    #[test]
    fn macd_histogram_is_line_minus_signal() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let v = macd(&prices, 12, 26, 9);
        assert_approx(v.histogram, v.macd - v.signal, 1e-12);
    }

    #[test]
    fn macd_single_price_is_all_zero() {
        let v = macd(&[100.0], 12, 26, 9);
        assert_approx(v.macd, 0.0, 1e-12);
        assert_approx(v.signal, 0.0, 1e-12);
        assert_approx(v.histogram, 0.0, 1e-12);
    }
}
