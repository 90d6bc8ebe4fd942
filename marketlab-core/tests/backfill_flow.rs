//! End-to-end backfill: gap detection feeding the coordinator against the
//! simulated exchange and an in-memory store.

use marketlab_core::backfill::{BackfillConfig, BackfillCoordinator, BackfillEvent, BackfillState};
use marketlab_core::domain::DateRange;
use marketlab_core::exchange::SimulatedExchange;
use marketlab_core::gaps::{find_missing_ranges, SAMPLE_INTERVAL_MS};
use marketlab_core::store::{MarketStore, MemoryStore};
use std::sync::Mutex;

const MIN: i64 = SAMPLE_INTERVAL_MS;

fn fast_config() -> BackfillConfig {
    BackfillConfig {
        iteration_pause_ms: 0,
        max_requests_per_minute: 10_000,
        ..BackfillConfig::default()
    }
}

#[test]
fn empty_store_backfills_the_whole_window() {
    let store = MemoryStore::new();
    let exchange = SimulatedExchange::new(42);
    let requested = DateRange::new(0, 120 * MIN);

    let ranges = find_missing_ranges(&requested, &store.timestamps("BTCUSDT").unwrap());
    assert_eq!(ranges, vec![requested]);

    let coordinator = BackfillCoordinator::new(fast_config());
    let written = coordinator
        .start(&exchange, &store, "BTCUSDT", &ranges, &|_: &BackfillEvent| {}, None)
        .unwrap();

    assert_eq!(written, 120);
    assert_eq!(store.count("BTCUSDT").unwrap(), 120);
    assert_eq!(coordinator.state(), BackfillState::Completed);

    // The window is now fully covered.
    let remaining = find_missing_ranges(&requested, &store.timestamps("BTCUSDT").unwrap());
    assert!(remaining.is_empty());
}

#[test]
fn detect_and_fill_internal_gap_only() {
    let store = MemoryStore::new();
    let exchange = SimulatedExchange::new(42);
    let requested = DateRange::new(0, 60 * MIN);

    // Seed the store with the full window, then punch a hole.
    let coordinator = BackfillCoordinator::new(fast_config());
    coordinator
        .start(&exchange, &store, "BTCUSDT", &[requested], &|_: &BackfillEvent| {}, None)
        .unwrap();

    let hole = DateRange::new(20 * MIN, 25 * MIN);
    let full = store.query_by_symbol("BTCUSDT", None, None).unwrap();
    let kept: Vec<_> = full
        .iter()
        .filter(|p| !hole.contains(p.timestamp))
        .cloned()
        .collect();

    let holed_store = MemoryStore::new();
    holed_store.add_batch(&kept).unwrap();

    let ranges = find_missing_ranges(&requested, &holed_store.timestamps("BTCUSDT").unwrap());
    assert_eq!(ranges, vec![hole]);

    let refill = BackfillCoordinator::new(fast_config());
    let written = refill
        .start(&exchange, &holed_store, "BTCUSDT", &ranges, &|_: &BackfillEvent| {}, None)
        .unwrap();
    assert_eq!(written, 5);

    // The refilled store matches the originally collected series exactly,
    // because the simulated exchange is deterministic per (symbol, minute).
    let refilled = holed_store.query_by_symbol("BTCUSDT", None, None).unwrap();
    assert_eq!(refilled, full);
}

#[test]
fn rerunning_backfill_writes_nothing_new() {
    let store = MemoryStore::new();
    let exchange = SimulatedExchange::new(7);
    let requested = DateRange::new(0, 30 * MIN);

    let first = BackfillCoordinator::new(fast_config());
    first
        .start(&exchange, &store, "BTCUSDT", &[requested], &|_: &BackfillEvent| {}, None)
        .unwrap();
    let count_after_first = store.count("BTCUSDT").unwrap();

    // No gaps remain, so the second job has nothing to do.
    let ranges = find_missing_ranges(&requested, &store.timestamps("BTCUSDT").unwrap());
    assert!(ranges.is_empty());

    let second = BackfillCoordinator::new(fast_config());
    let written = second
        .start(&exchange, &store, "BTCUSDT", &ranges, &|_: &BackfillEvent| {}, None)
        .unwrap();
    assert_eq!(written, 0);
    assert_eq!(store.count("BTCUSDT").unwrap(), count_after_first);
}

#[test]
fn progress_reports_cover_all_ranges_in_order() {
    let store = MemoryStore::new();
    let exchange = SimulatedExchange::new(42);
    let config = BackfillConfig {
        window_ms: 5 * MIN,
        ..fast_config()
    };
    let coordinator = BackfillCoordinator::new(config);

    let ranges = [
        DateRange::new(0, 10 * MIN),
        DateRange::new(30 * MIN, 40 * MIN),
    ];
    let snapshots = Mutex::new(Vec::new());
    let sink = |e: &BackfillEvent| {
        if let BackfillEvent::Progress(p) = e {
            snapshots.lock().unwrap().push(p.clone());
        }
    };

    coordinator
        .start(&exchange, &store, "BTCUSDT", &ranges, &sink, None)
        .unwrap();

    let snapshots = snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 4);
    assert!(snapshots.iter().all(|p| p.total_ranges == 2));
    assert_eq!(snapshots[0].range_index, 0);
    assert_eq!(snapshots[3].range_index, 1);
    assert!(snapshots.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert!(snapshots
        .windows(2)
        .all(|w| w[0].records_collected <= w[1].records_collected));
    assert!((snapshots[3].percent - 100.0).abs() < 1e-9);
}
