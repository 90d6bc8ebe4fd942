//! Trade signal rule — one decision per bar from consecutive indicator sets.
//!
//! Entries and exits are position-gated: BUY conditions are only consulted
//! while flat, SELL conditions only while holding. Each side is an OR of four
//! conditions (RSI threshold crossing, MACD histogram zero crossing, SMA
//! crossover, price outside a Bollinger band).

use crate::domain::StrategyParameters;
use crate::indicators::IndicatorSet;
use serde::{Deserialize, Serialize};

/// Per-bar trading decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Evaluate the signal for one bar.
///
/// `prev` is the indicator set of the previous bar, `curr` the current one,
/// `price` the current bar's price.
pub fn evaluate_signal(
    prev: &IndicatorSet,
    curr: &IndicatorSet,
    price: f64,
    in_position: bool,
    params: &StrategyParameters,
) -> Signal {
    if !in_position {
        let oversold = params.rsi_oversold as f64;
        let rsi_bounce = prev.rsi < oversold && curr.rsi >= oversold;
        let macd_turn = prev.macd.histogram < 0.0 && curr.macd.histogram >= 0.0;
        let golden_cross =
            prev.sma_short < prev.sma_long && curr.sma_short >= curr.sma_long;
        let below_lower_band = price < curr.bollinger.lower;

        if rsi_bounce || macd_turn || golden_cross || below_lower_band {
            return Signal::Buy;
        }
    } else {
        let overbought = params.rsi_overbought as f64;
        let rsi_fade = prev.rsi > overbought && curr.rsi <= overbought;
        let macd_turn = prev.macd.histogram > 0.0 && curr.macd.histogram <= 0.0;
        let death_cross =
            prev.sma_short > prev.sma_long && curr.sma_short <= curr.sma_long;
        let above_upper_band = price > curr.bollinger.upper;

        if rsi_fade || macd_turn || death_cross || above_upper_band {
            return Signal::Sell;
        }
    }
    Signal::Hold
}
