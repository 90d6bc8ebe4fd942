//! Position-based trade simulation over a price series.
//!
//! One position at a time, long only. A BUY opens at the bar's price and
//! counts a trade; a SELL closes it and books the percentage return. A
//! position still open when the series ends contributes no P&L.

use super::signal::{evaluate_signal, Signal};
use crate::domain::{MarketDataPoint, StrategyParameters, StrategyPerformance};
use crate::indicators::{compute_series, IndicatorError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("price series is empty")]
    EmptyInput,
}

impl From<IndicatorError> for SimulationError {
    fn from(err: IndicatorError) -> Self {
        match err {
            IndicatorError::EmptyInput => SimulationError::EmptyInput,
        }
    }
}

/// Single-position P&L bookkeeping, percentage returns.
#[derive(Debug, Default)]
struct PositionTracker {
    in_position: bool,
    entry_price: f64,
    total_trades: usize,
    successful_trades: usize,
    total_profit: f64,
    total_loss: f64,
}

impl PositionTracker {
    fn in_position(&self) -> bool {
        self.in_position
    }

    fn on_signal(&mut self, signal: Signal, price: f64) {
        match signal {
            Signal::Buy if !self.in_position => {
                self.in_position = true;
                self.entry_price = price;
                self.total_trades += 1;
            }
            Signal::Sell if self.in_position => {
                let pct_return = (price - self.entry_price) / self.entry_price * 100.0;
                if pct_return > 0.0 {
                    self.successful_trades += 1;
                    self.total_profit += pct_return;
                } else {
                    self.total_loss += pct_return.abs();
                }
                self.in_position = false;
            }
            _ => {}
        }
    }

    fn performance(&self) -> StrategyPerformance {
        let win_rate = if self.total_trades > 0 {
            self.successful_trades as f64 / self.total_trades as f64 * 100.0
        } else {
            0.0
        };
        let profit_factor = if self.total_loss > 0.0 {
            self.total_profit / self.total_loss
        } else {
            0.0
        };
        StrategyPerformance {
            win_rate,
            profit_factor,
            total_trades: self.total_trades,
            successful_trades: self.successful_trades,
        }
    }
}

/// Simulate the strategy over a stored series.
pub fn simulate(
    series: &[MarketDataPoint],
    params: &StrategyParameters,
) -> Result<StrategyPerformance, SimulationError> {
    let prices: Vec<f64> = series.iter().map(|p| p.price).collect();
    simulate_prices(&prices, params)
}

/// Simulate the strategy over a bare price series.
///
/// A series shorter than the warmup window plus one trading bar produces a
/// zero-trade performance; only an empty series is an error.
pub fn simulate_prices(
    prices: &[f64],
    params: &StrategyParameters,
) -> Result<StrategyPerformance, SimulationError> {
    if prices.is_empty() {
        return Err(SimulationError::EmptyInput);
    }

    let warmup = params.warmup_window();
    let sets = compute_series(prices, params)?;
    if sets.len() < 2 {
        return Ok(StrategyPerformance::no_trades());
    }

    let mut tracker = PositionTracker::default();
    for i in warmup..prices.len() {
        // Set k covers the window ending at bar k + warmup - 1.
        let prev = &sets[i - warmup];
        let curr = &sets[i - warmup + 1];
        let signal = evaluate_signal(prev, curr, prices[i], tracker.in_position(), params);
        tracker.on_signal(signal, prices[i]);
    }

    Ok(tracker.performance())
}
