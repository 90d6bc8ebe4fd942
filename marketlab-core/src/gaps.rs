//! Gap detection — which sub-ranges of a requested window are missing.
//!
//! The store samples one point per minute. A stored timestamp `t` covers
//! `[t, t + interval)`; anything the cursor walk finds uncovered inside the
//! requested window is a gap. Detection is full: leading and trailing
//! boundary gaps as well as internal gaps between consecutive stored points.

use crate::domain::DateRange;

/// Expected sampling interval of the stored series: one minute.
pub const SAMPLE_INTERVAL_MS: i64 = 60_000;

/// Missing sub-ranges of `requested` given the stored timestamps for a symbol.
///
/// `existing_ts_asc` must be sorted ascending (the store returns it that way).
/// The result is ascending, non-overlapping and clipped to the requested
/// window. An empty store yields the whole window; a store with one point per
/// minute across the window yields nothing.
pub fn find_missing_ranges(requested: &DateRange, existing_ts_asc: &[i64]) -> Vec<DateRange> {
    debug_assert!(
        existing_ts_asc.windows(2).all(|w| w[0] <= w[1]),
        "existing timestamps must be sorted ascending"
    );

    let mut ranges = Vec::new();
    let mut cursor = requested.start_ms;

    for &ts in existing_ts_asc {
        if cursor >= requested.end_ms {
            break;
        }
        if ts > cursor {
            ranges.push(DateRange::new(cursor, ts.min(requested.end_ms)));
        }
        cursor = cursor.max(ts + SAMPLE_INTERVAL_MS);
    }

    if cursor < requested.end_ms {
        ranges.push(DateRange::new(cursor, requested.end_ms));
    }

    ranges
}
