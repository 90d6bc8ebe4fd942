//! Parameter grid for the strategy optimizer.
//!
//! Fixed value lists per dimension; `combinations` materializes the cross
//! product, skipping invalid pairs (`macd_slow <= macd_fast`,
//! `sma_long <= sma_short`). The RSI overbought threshold is derived as the
//! complement of oversold, and the MACD signal period stays at its default.

use crate::domain::StrategyParameters;
use serde::{Deserialize, Serialize};

/// Value lists for each searched dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub rsi_periods: Vec<usize>,
    pub rsi_oversold: Vec<u32>,
    pub macd_fast: Vec<usize>,
    pub macd_slow: Vec<usize>,
    pub sma_short: Vec<usize>,
    pub sma_long: Vec<usize>,
    pub bollinger_periods: Vec<usize>,
    pub bollinger_std_devs: Vec<f64>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            rsi_periods: vec![10, 12, 14, 16, 18, 20],
            rsi_oversold: vec![25, 27, 29, 31, 33, 35],
            macd_fast: vec![8, 10, 12, 14, 16],
            macd_slow: vec![20, 22, 24, 26, 28, 30],
            sma_short: vec![10, 15, 20, 25, 30],
            sma_long: vec![40, 45, 50, 55, 60],
            bollinger_periods: vec![15, 20, 25],
            bollinger_std_devs: vec![1.5, 2.0, 2.5],
        }
    }
}

impl ParameterGrid {
    /// All valid parameter sets in the grid, in deterministic order.
    pub fn combinations(&self) -> Vec<StrategyParameters> {
        let defaults = StrategyParameters::default();
        let mut combos = Vec::new();

        for &rsi_period in &self.rsi_periods {
            for &rsi_oversold in &self.rsi_oversold {
                for &macd_fast in &self.macd_fast {
                    for &macd_slow in &self.macd_slow {
                        if macd_slow <= macd_fast {
                            continue;
                        }
                        for &sma_short in &self.sma_short {
                            for &sma_long in &self.sma_long {
                                if sma_long <= sma_short {
                                    continue;
                                }
                                for &bollinger_period in &self.bollinger_periods {
                                    for &bollinger_std_dev in &self.bollinger_std_devs {
                                        combos.push(StrategyParameters {
                                            rsi_period,
                                            rsi_oversold,
                                            rsi_overbought: 100 - rsi_oversold,
                                            macd_fast,
                                            macd_slow,
                                            macd_signal: defaults.macd_signal,
                                            sma_short,
                                            sma_long,
                                            bollinger_period,
                                            bollinger_std_dev,
                                        });
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        combos
    }

    /// Number of valid combinations.
    pub fn size(&self) -> usize {
        self.combinations().len()
    }
}
