//! Bollinger Bands — moving average +/- standard deviation multiplier.
//!
//! Middle = SMA(period); upper/lower = middle +/- mult * population stddev of
//! the trailing `period` prices. Insufficient data returns all-zero bands,
//! which still satisfy the `upper >= middle >= lower` ordering.

use super::sma::sma;
use serde::{Deserialize, Serialize};

/// The three Bollinger band values for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Bollinger Bands over the trailing `period` prices.
pub fn bollinger(prices: &[f64], period: usize, std_dev_mult: f64) -> BollingerBands {
    if period == 0 || prices.len() < period {
        return BollingerBands {
            upper: 0.0,
            middle: 0.0,
            lower: 0.0,
        };
    }
    let middle = sma(prices, period);
    let window = &prices[prices.len() - period..];
    let variance = window
        .iter()
        .map(|p| {
            let diff = p - middle;
            diff * diff
        })
        .sum::<f64>()
        / period as f64;
    let band_width = std_dev_mult * variance.sqrt();
    BollingerBands {
        upper: middle + band_width,
        middle,
        lower: middle - band_width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn middle_is_sma() {
        let prices = [10.0, 11.0, 12.0, 13.0, 14.0];
        let bands = bollinger(&prices, 3, 2.0);
        assert_approx(bands.middle, 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bands_are_symmetric_around_middle() {
        let prices = [10.0, 11.0, 12.0, 13.0, 14.0];
        let bands = bollinger(&prices, 3, 2.0);
        assert_approx(
            bands.upper - bands.middle,
            bands.middle - bands.lower,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn bands_ordered_for_any_window() {
        let prices = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0];
        for period in 1..=prices.len() {
            let b = bollinger(&prices, period, 2.0);
            assert!(b.upper >= b.middle && b.middle >= b.lower);
        }
    }

    #[test]
    fn constant_prices_collapse_bands() {
        let bands = bollinger(&[100.0; 5], 3, 2.0);
        assert_approx(bands.upper, 100.0, DEFAULT_EPSILON);
        assert_approx(bands.lower, 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn known_population_stddev() {
        // window [2, 4, 6]: mean 4, variance (4 + 0 + 4) / 3, stddev = sqrt(8/3)
        let bands = bollinger(&[2.0, 4.0, 6.0], 3, 1.0);
        assert_approx(bands.upper, 4.0 + (8.0f64 / 3.0).sqrt(), 1e-9);
    }

    #[test]
    fn insufficient_data_is_zero_bands() {
        let bands = bollinger(&[1.0, 2.0], 3, 2.0);
        assert_eq!(bands.upper, 0.0);
        assert_eq!(bands.middle, 0.0);
        assert_eq!(bands.lower, 0.0);
    }
}
