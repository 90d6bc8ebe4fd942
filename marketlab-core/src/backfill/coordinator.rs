//! Backfill coordinator — walks missing ranges in day-sized fetch windows.
//!
//! State machine: `Idle -> Collecting -> {Completed | Paused | Failed}`.
//! The loop is cooperative and single-threaded: fetch one window, write one
//! batch set, report progress, check the pause/cancel flags, yield briefly.
//! Cancellation therefore lands on a batch boundary, never mid-write.

use super::rate_limiter::RateLimiter;
use crate::domain::{DateRange, MarketDataPoint, DAY_MS};
use crate::exchange::{Candle, CandleInterval, ExchangeClient, FetchError};
use crate::store::{MarketStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle of one backfill job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackfillState {
    Idle,
    Collecting,
    Completed,
    Paused,
    Failed,
}

/// Progress snapshot emitted after every fetch window.
///
/// `percent` is time-based — elapsed milliseconds across all ranges over the
/// total requested milliseconds — and never decreases within one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionProgress {
    pub range_index: usize,
    pub total_ranges: usize,
    /// Leading edge of the collection, milliseconds since epoch.
    pub current_ms: i64,
    pub percent: f64,
    pub records_collected: usize,
}

/// Everything a backfill job reports, success and failure alike, so callers
/// watch a single channel.
#[derive(Debug, Clone)]
pub enum BackfillEvent {
    Progress(CollectionProgress),
    Completed { records_collected: usize },
    Paused { records_collected: usize },
    Failed { error: String },
}

/// Progress sink invoked synchronously from the job loop; must not block.
pub trait BackfillSink {
    fn event(&self, event: &BackfillEvent);
}

impl<F: Fn(&BackfillEvent)> BackfillSink for F {
    fn event(&self, event: &BackfillEvent) {
        self(event)
    }
}

/// Sink that prints whole-percent progress steps to stdout.
pub struct StdoutSink {
    last_whole_percent: Mutex<i64>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            last_whole_percent: Mutex::new(-1),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl BackfillSink for StdoutSink {
    fn event(&self, event: &BackfillEvent) {
        match event {
            BackfillEvent::Progress(p) => {
                let whole = p.percent.floor() as i64;
                let mut last = self.last_whole_percent.lock().unwrap();
                if whole > *last {
                    *last = whole;
                    println!(
                        "[{:>3}%] range {}/{} at {} ({} records)",
                        whole,
                        p.range_index + 1,
                        p.total_ranges,
                        crate::domain::format_ms(p.current_ms),
                        p.records_collected
                    );
                }
            }
            BackfillEvent::Completed { records_collected } => {
                println!("Backfill complete: {records_collected} records written");
            }
            BackfillEvent::Paused { records_collected } => {
                println!("Backfill paused: {records_collected} records written so far");
            }
            BackfillEvent::Failed { error } => {
                println!("Backfill FAILED: {error}");
            }
        }
    }
}

/// Tuning knobs for one backfill job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Candle resolution requested from the exchange.
    pub interval: CandleIntervalConfig,
    /// Fetch window size in milliseconds.
    pub window_ms: i64,
    /// Points per store write.
    pub batch_size: usize,
    /// Retries per fetch window on transient errors.
    pub max_retries: u32,
    /// Fixed delay between retries, milliseconds.
    pub retry_delay_ms: u64,
    pub max_requests_per_minute: u32,
    /// Yield between iterations so a co-hosted caller is not starved.
    pub iteration_pause_ms: u64,
}

/// Serializable stand-in for `CandleInterval` in configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleIntervalConfig {
    OneMinute,
    OneHour,
    OneDay,
}

impl From<CandleIntervalConfig> for CandleInterval {
    fn from(value: CandleIntervalConfig) -> Self {
        match value {
            CandleIntervalConfig::OneMinute => CandleInterval::OneMinute,
            CandleIntervalConfig::OneHour => CandleInterval::OneHour,
            CandleIntervalConfig::OneDay => CandleInterval::OneDay,
        }
    }
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            interval: CandleIntervalConfig::OneMinute,
            window_ms: DAY_MS,
            batch_size: 1000,
            max_retries: 3,
            retry_delay_ms: 5000,
            max_requests_per_minute: 60,
            iteration_pause_ms: 10,
        }
    }
}

/// Errors from the backfill coordinator.
#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("a backfill job is already running on this coordinator")]
    AlreadyRunning,

    #[error("exchange fetch failed after {attempts} attempts: {source}")]
    Exchange {
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("malformed candle from exchange: {0}")]
    InvalidCandle(String),

    #[error("store write failed: {source}")]
    Store {
        #[from]
        source: StoreError,
    },
}

enum RunOutcome {
    Completed(usize),
    Paused(usize),
}

/// Per-job coordinator. Owns the rate limiter and the pause flag; there is no
/// process-global state, so independent jobs use independent coordinators.
pub struct BackfillCoordinator {
    config: BackfillConfig,
    limiter: RateLimiter,
    running: AtomicBool,
    pause_requested: AtomicBool,
    state: Mutex<BackfillState>,
}

impl BackfillCoordinator {
    pub fn new(config: BackfillConfig) -> Self {
        let limiter = RateLimiter::per_minute(config.max_requests_per_minute);
        Self {
            config,
            limiter,
            running: AtomicBool::new(false),
            pause_requested: AtomicBool::new(false),
            state: Mutex::new(BackfillState::Idle),
        }
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    pub fn state(&self) -> BackfillState {
        *self.state.lock().unwrap()
    }

    /// Request a cooperative pause. Takes effect after the in-flight fetch
    /// window finishes, never mid-write.
    pub fn pause(&self) {
        self.pause_requested.store(true, Ordering::Relaxed);
    }

    /// Collect all `ranges` for `symbol` from the exchange into the store.
    ///
    /// Runs on the calling thread until completion, pause or failure, and
    /// returns the number of records written. Progress, completion, pause and
    /// failure are all reported through `sink`. A second `start` while one is
    /// running is rejected with `AlreadyRunning` and changes nothing.
    /// `cancel`, when set by another thread, behaves exactly like `pause`.
    pub fn start(
        &self,
        exchange: &dyn ExchangeClient,
        store: &dyn MarketStore,
        symbol: &str,
        ranges: &[DateRange],
        sink: &dyn BackfillSink,
        cancel: Option<&AtomicBool>,
    ) -> Result<usize, BackfillError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BackfillError::AlreadyRunning);
        }
        self.pause_requested.store(false, Ordering::Relaxed);
        *self.state.lock().unwrap() = BackfillState::Collecting;

        let outcome = self.run(exchange, store, symbol, ranges, sink, cancel);

        let result = match outcome {
            Ok(RunOutcome::Completed(records)) => {
                *self.state.lock().unwrap() = BackfillState::Completed;
                sink.event(&BackfillEvent::Completed {
                    records_collected: records,
                });
                Ok(records)
            }
            Ok(RunOutcome::Paused(records)) => {
                *self.state.lock().unwrap() = BackfillState::Paused;
                sink.event(&BackfillEvent::Paused {
                    records_collected: records,
                });
                Ok(records)
            }
            Err(error) => {
                *self.state.lock().unwrap() = BackfillState::Failed;
                sink.event(&BackfillEvent::Failed {
                    error: error.to_string(),
                });
                Err(error)
            }
        };

        self.running.store(false, Ordering::SeqCst);
        result
    }

    fn run(
        &self,
        exchange: &dyn ExchangeClient,
        store: &dyn MarketStore,
        symbol: &str,
        ranges: &[DateRange],
        sink: &dyn BackfillSink,
        cancel: Option<&AtomicBool>,
    ) -> Result<RunOutcome, BackfillError> {
        let total_ms: i64 = ranges.iter().map(|r| r.duration_ms()).sum();
        if total_ms == 0 {
            return Ok(RunOutcome::Completed(0));
        }

        let total_ranges = ranges.len();
        let mut elapsed_ms: i64 = 0;
        let mut records: usize = 0;
        let mut last_percent: f64 = 0.0;
        let pause = Duration::from_millis(self.config.iteration_pause_ms);

        for (range_index, range) in ranges.iter().enumerate() {
            let mut cursor = range.start_ms;
            while cursor < range.end_ms {
                if self.should_stop(cancel) {
                    return Ok(RunOutcome::Paused(records));
                }

                let window_end = (cursor + self.config.window_ms).min(range.end_ms);

                self.limiter.acquire();
                let candles = self.fetch_with_retry(exchange, symbol, cursor, window_end)?;
                let points = parse_candles(symbol, &candles)?;

                for chunk in points.chunks(self.config.batch_size.max(1)) {
                    store.add_batch(chunk)?;
                }
                records += points.len();

                elapsed_ms += window_end - cursor;
                let percent =
                    (elapsed_ms as f64 / total_ms as f64 * 100.0).clamp(last_percent, 100.0);
                last_percent = percent;

                sink.event(&BackfillEvent::Progress(CollectionProgress {
                    range_index,
                    total_ranges,
                    current_ms: window_end,
                    percent,
                    records_collected: records,
                }));

                cursor = window_end;
                if !pause.is_zero() {
                    std::thread::sleep(pause);
                }
            }
        }

        Ok(RunOutcome::Completed(records))
    }

    fn should_stop(&self, cancel: Option<&AtomicBool>) -> bool {
        self.pause_requested.load(Ordering::Relaxed)
            || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn fetch_with_retry(
        &self,
        exchange: &dyn ExchangeClient,
        symbol: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, BackfillError> {
        let interval: CandleInterval = self.config.interval.into();
        let mut attempts = 0;
        loop {
            attempts += 1;
            match exchange.candles(symbol, interval, start_ms, end_ms) {
                Ok(candles) => return Ok(candles),
                Err(source) if source.is_retryable() && attempts <= self.config.max_retries => {
                    std::thread::sleep(Duration::from_millis(self.config.retry_delay_ms));
                }
                Err(source) => return Err(BackfillError::Exchange { attempts, source }),
            }
        }
    }
}

/// Transform exchange candles into store points.
///
/// `timestamp = open_time`, `price = close`, `volume = volume`; the string
/// fields are parsed here, and a bad payload fails the job rather than
/// silently writing garbage.
fn parse_candles(symbol: &str, candles: &[Candle]) -> Result<Vec<MarketDataPoint>, BackfillError> {
    candles
        .iter()
        .map(|candle| {
            let price: f64 = candle.close.parse().map_err(|_| {
                BackfillError::InvalidCandle(format!(
                    "close '{}' at open_time {}",
                    candle.close, candle.open_time
                ))
            })?;
            let volume: f64 = candle.volume.parse().map_err(|_| {
                BackfillError::InvalidCandle(format!(
                    "volume '{}' at open_time {}",
                    candle.volume, candle.open_time
                ))
            })?;
            Ok(MarketDataPoint {
                timestamp: candle.open_time,
                symbol: symbol.to_string(),
                price,
                volume,
            })
        })
        .collect()
}
