//! Property tests for engine invariants.

use marketlab_core::domain::{DateRange, MarketDataPoint};
use marketlab_core::gaps::{find_missing_ranges, SAMPLE_INTERVAL_MS};
use marketlab_core::indicators::{bollinger, rsi};
use marketlab_core::store::{MarketStore, MemoryStore};
use proptest::prelude::*;

fn price_vec() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01f64..100_000.0, 1..60)
}

proptest! {
    #[test]
    fn bollinger_bands_are_ordered(prices in price_vec(), period in 1usize..30, mult in 0.5f64..4.0) {
        let bands = bollinger(&prices, period, mult);
        prop_assert!(bands.upper >= bands.middle);
        prop_assert!(bands.middle >= bands.lower);
    }

    #[test]
    fn rsi_stays_in_range(prices in price_vec(), period in 1usize..30) {
        let value = rsi(&prices, period);
        prop_assert!((0.0..=100.0).contains(&value));
    }

    #[test]
    fn gaps_are_sorted_disjoint_and_clipped(
        mut timestamps in prop::collection::vec(0i64..10_000, 0..120),
        start_minute in 0i64..50,
        len_minutes in 1i64..100,
    ) {
        timestamps.sort_unstable();
        let existing: Vec<i64> = timestamps.iter().map(|m| m * SAMPLE_INTERVAL_MS).collect();
        let requested = DateRange::new(
            start_minute * SAMPLE_INTERVAL_MS,
            (start_minute + len_minutes) * SAMPLE_INTERVAL_MS,
        );

        let ranges = find_missing_ranges(&requested, &existing);

        for range in &ranges {
            prop_assert!(range.start_ms < range.end_ms);
            prop_assert!(range.start_ms >= requested.start_ms);
            prop_assert!(range.end_ms <= requested.end_ms);
        }
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].end_ms <= pair[1].start_ms);
        }
    }

    #[test]
    fn gap_total_never_exceeds_window(
        mut timestamps in prop::collection::vec(0i64..2_000, 0..80),
        len_minutes in 1i64..200,
    ) {
        timestamps.sort_unstable();
        let existing: Vec<i64> = timestamps.iter().map(|m| m * SAMPLE_INTERVAL_MS).collect();
        let requested = DateRange::new(0, len_minutes * SAMPLE_INTERVAL_MS);

        let ranges = find_missing_ranges(&requested, &existing);
        let missing_total: i64 = ranges.iter().map(|r| r.duration_ms()).sum();
        prop_assert!(missing_total <= requested.duration_ms());
    }

    #[test]
    fn store_writes_are_idempotent(
        minutes in prop::collection::vec(0i64..500, 1..50),
    ) {
        let store = MemoryStore::new();
        let points: Vec<MarketDataPoint> = minutes
            .iter()
            .map(|&m| MarketDataPoint {
                timestamp: m * SAMPLE_INTERVAL_MS,
                symbol: "BTCUSDT".into(),
                price: 100.0,
                volume: 1.0,
            })
            .collect();

        store.add_batch(&points).unwrap();
        let count_once = store.count("BTCUSDT").unwrap();
        store.add_batch(&points).unwrap();
        prop_assert_eq!(store.count("BTCUSDT").unwrap(), count_once);
    }

    #[test]
    fn filling_reported_gaps_leaves_no_gaps(
        mut timestamps in prop::collection::vec(0i64..300, 0..60),
        len_minutes in 1i64..300,
    ) {
        timestamps.sort_unstable();
        timestamps.dedup();
        let existing: Vec<i64> = timestamps.iter().map(|m| m * SAMPLE_INTERVAL_MS).collect();
        let requested = DateRange::new(0, len_minutes * SAMPLE_INTERVAL_MS);

        // Simulate a perfect backfill: one point per minute inside each gap.
        let mut all: Vec<i64> = existing.clone();
        for range in find_missing_ranges(&requested, &existing) {
            let mut ts = range.start_ms;
            while ts < range.end_ms {
                all.push(ts);
                ts += SAMPLE_INTERVAL_MS;
            }
        }
        all.sort_unstable();
        all.dedup();

        prop_assert!(find_missing_ranges(&requested, &all).is_empty());
    }
}
