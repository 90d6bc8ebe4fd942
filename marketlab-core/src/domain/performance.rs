//! Aggregate performance of one simulated strategy run.

use serde::{Deserialize, Serialize};

/// Win rate and profit factor over a simulated trade sequence.
///
/// `profit_factor` is 0 when no losses were recorded, so a run with only
/// winning trades reports 0 — read it together with `total_trades`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPerformance {
    /// Percentage of trades that closed at a profit, in `[0, 100]`.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub successful_trades: usize,
}

impl StrategyPerformance {
    /// Performance of a run that never traded.
    pub fn no_trades() -> Self {
        Self {
            win_rate: 0.0,
            profit_factor: 0.0,
            total_trades: 0,
            successful_trades: 0,
        }
    }
}
