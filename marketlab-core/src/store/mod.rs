//! Time-series store trait and structured error types.
//!
//! The store abstracts over the physical engine so the backfill and
//! optimization jobs never see a concrete database. Writes are idempotent on
//! `(symbol, timestamp)`: re-inserting an existing point is a no-op. Reference
//! adapters: `memory` (tests, demos) and `csv` (one file per symbol on disk).

pub mod csv;
pub mod memory;

pub use self::csv::CsvStore;
pub use self::memory::MemoryStore;

use crate::domain::MarketDataPoint;
use thiserror::Error;

/// Structured error types for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write failed: {0}")]
    Write(String),

    #[error("store I/O error: {0}")]
    Io(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Trait for time-series stores holding `MarketDataPoint`s.
///
/// Implementations take `&self` and synchronize internally; the backfill
/// coordinator holds one reference for the whole job.
pub trait MarketStore: Send + Sync {
    /// Insert one point. Returns `true` if the point was new.
    fn add(&self, point: &MarketDataPoint) -> Result<bool, StoreError>;

    /// Insert a batch of points. Returns how many were newly inserted;
    /// duplicates are silently skipped.
    fn add_batch(&self, points: &[MarketDataPoint]) -> Result<usize, StoreError>;

    /// All points for a symbol within `[start_ms, end_ms)`, sorted by
    /// timestamp ascending. `None` bounds are unbounded.
    fn query_by_symbol(
        &self,
        symbol: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
    ) -> Result<Vec<MarketDataPoint>, StoreError>;

    /// Earliest and latest stored point for a symbol.
    fn oldest_and_newest(
        &self,
        symbol: &str,
    ) -> Result<(Option<MarketDataPoint>, Option<MarketDataPoint>), StoreError>;

    /// All stored timestamps for a symbol, ascending. Input to gap detection.
    fn timestamps(&self, symbol: &str) -> Result<Vec<i64>, StoreError>;

    /// Number of stored points for a symbol.
    fn count(&self, symbol: &str) -> Result<usize, StoreError>;
}
