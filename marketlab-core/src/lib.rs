//! MarketLab Core — backfill and backtest engine for minute-resolution market data.
//!
//! This crate contains the heart of the system:
//! - Domain types (data points, date ranges, strategy parameters, performance)
//! - Indicator engine (SMA, EMA, RSI, MACD, Bollinger Bands)
//! - Gap detection over stored time series
//! - Backfill coordinator with token-bucket rate limiting and cooperative pause
//! - Strategy simulator (position-based P&L)
//! - Parameter optimizer (grid search with train/validation split)
//!
//! Collaborators (exchange client, time-series store) are traits; reference
//! implementations live in `exchange::sim` and `store::{memory, csv}`.

pub mod backfill;
pub mod domain;
pub mod exchange;
pub mod gaps;
pub mod indicators;
pub mod optimize;
pub mod store;
pub mod strategy;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types that cross the worker-thread boundary are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::MarketDataPoint>();
        require_sync::<domain::MarketDataPoint>();
        require_send::<domain::DateRange>();
        require_sync::<domain::DateRange>();
        require_send::<domain::StrategyParameters>();
        require_sync::<domain::StrategyParameters>();
        require_send::<domain::StrategyPerformance>();
        require_sync::<domain::StrategyPerformance>();

        require_send::<indicators::IndicatorSet>();
        require_sync::<indicators::IndicatorSet>();

        require_send::<backfill::BackfillConfig>();
        require_sync::<backfill::BackfillConfig>();
        require_send::<backfill::BackfillCoordinator>();
        require_sync::<backfill::BackfillCoordinator>();
        require_send::<backfill::BackfillEvent>();
        require_sync::<backfill::BackfillEvent>();
        require_send::<backfill::CollectionProgress>();
        require_sync::<backfill::CollectionProgress>();

        require_send::<optimize::Optimizer>();
        require_sync::<optimize::Optimizer>();
        require_send::<optimize::OptimizationProgress>();
        require_sync::<optimize::OptimizationProgress>();
        require_send::<optimize::OptimizationResult>();
        require_sync::<optimize::OptimizationResult>();

        require_send::<store::memory::MemoryStore>();
        require_sync::<store::memory::MemoryStore>();
        require_send::<exchange::sim::SimulatedExchange>();
        require_sync::<exchange::sim::SimulatedExchange>();
    }
}
