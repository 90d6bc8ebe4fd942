//! Exponential Moving Average (EMA).
//!
//! Seeded with the SMA of the first `period` prices, then smoothed over the
//! remainder with multiplier `2 / (period + 1)`. Returns 0.0 when the window
//! holds fewer than `period` prices.

/// EMA over the full price window.
pub fn ema(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period {
        return 0.0;
    }
    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
    for &price in &prices[period..] {
        ema = (price - ema) * multiplier + ema;
    }
    ema
}
