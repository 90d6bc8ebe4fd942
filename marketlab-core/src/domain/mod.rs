//! Domain types shared across the engine.

pub mod params;
pub mod performance;
pub mod point;
pub mod range;

pub use params::{ParamsError, StrategyParameters};
pub use performance::StrategyPerformance;
pub use point::MarketDataPoint;
pub use range::DateRange;

/// Milliseconds per day, the fetch window size used by the backfill loop.
pub const DAY_MS: i64 = 86_400_000;

/// Render a millisecond epoch timestamp as UTC `YYYY-MM-DD HH:MM`.
///
/// Timestamps outside chrono's representable range fall back to the raw value.
pub fn format_ms(ts: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(ts) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => format!("{ts}ms"),
    }
}
