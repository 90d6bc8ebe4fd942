//! Strategy parameters — the knobs the optimizer searches over.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameter set for the trading strategy.
///
/// Period pairs are ordered (`macd_slow > macd_fast`, `sma_long > sma_short`)
/// and the RSI thresholds are complementary (`rsi_overbought = 100 - rsi_oversold`).
/// `validate` checks the ordering; the grid generator never produces invalid sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParameters {
    pub rsi_period: usize,
    pub rsi_oversold: u32,
    pub rsi_overbought: u32,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30,
            rsi_overbought: 70,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sma_short: 20,
            sma_long: 50,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
        }
    }
}

impl StrategyParameters {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.rsi_period == 0
            || self.macd_fast == 0
            || self.macd_signal == 0
            || self.sma_short == 0
            || self.bollinger_period == 0
        {
            return Err(ParamsError::ZeroPeriod);
        }
        if self.macd_slow <= self.macd_fast {
            return Err(ParamsError::MacdOrder {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        if self.sma_long <= self.sma_short {
            return Err(ParamsError::SmaOrder {
                short: self.sma_short,
                long: self.sma_long,
            });
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(ParamsError::RsiThresholds {
                oversold: self.rsi_oversold,
                overbought: self.rsi_overbought,
            });
        }
        Ok(())
    }

    /// Number of trailing prices every indicator in the set needs to be computable.
    ///
    /// RSI needs `period + 1` prices for `period` deltas; the MACD signal line
    /// needs the slow EMA plus the signal EMA to have seeded.
    pub fn warmup_window(&self) -> usize {
        self.sma_long
            .max(self.rsi_period + 1)
            .max(self.macd_slow + self.macd_signal)
            .max(self.bollinger_period)
    }
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("all indicator periods must be >= 1")]
    ZeroPeriod,
    #[error("macd_slow ({slow}) must exceed macd_fast ({fast})")]
    MacdOrder { fast: usize, slow: usize },
    #[error("sma_long ({long}) must exceed sma_short ({short})")]
    SmaOrder { short: usize, long: usize },
    #[error("rsi_oversold ({oversold}) must be below rsi_overbought ({overbought})")]
    RsiThresholds { oversold: u32, overbought: u32 },
}
