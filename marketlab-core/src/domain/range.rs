//! DateRange — half-open millisecond window `[start, end)`.

use serde::{Deserialize, Serialize};

/// Half-open time window in millisecond epoch time.
///
/// Invariant: `start_ms < end_ms`, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DateRange {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        assert!(
            start_ms < end_ms,
            "DateRange requires start < end (got {start_ms}..{end_ms})"
        );
        Self { start_ms, end_ms }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start_ms && ts < self.end_ms
    }

    /// Intersect with another window; `None` when the windows are disjoint.
    pub fn clip(&self, window: &DateRange) -> Option<DateRange> {
        let start = self.start_ms.max(window.start_ms);
        let end = self.end_ms.min(window.end_ms);
        if start < end {
            Some(DateRange::new(start, end))
        } else {
            None
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} .. {})",
            super::format_ms(self.start_ms),
            super::format_ms(self.end_ms)
        )
    }
}
