//! Backfill and optimization jobs — store, exchange and engine wired together.

use crate::config::JobConfig;
use marketlab_core::backfill::{BackfillCoordinator, BackfillError, BackfillSink, BackfillState};
use marketlab_core::exchange::ExchangeClient;
use marketlab_core::gaps::find_missing_ranges;
use marketlab_core::optimize::{
    OptimizationBaseline, OptimizationProgress, OptimizationResult, OptimizeError, Optimizer,
    ParameterGrid,
};
use marketlab_core::store::{MarketStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use thiserror::Error;

/// What a finished (or stopped) backfill job did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillSummary {
    pub symbol: String,
    pub ranges_detected: usize,
    pub records_written: usize,
    pub final_state: BackfillState,
}

/// The optimizer's answer plus enough context to reproduce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub config_id: String,
    pub symbol: String,
    pub series_len: usize,
    /// BLAKE3 of the input series; ties the result to the exact data it saw.
    pub dataset_hash: String,
    pub baseline_win_rate: f64,
    pub result: OptimizationResult,
    pub elapsed_secs: f64,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("backfill error: {0}")]
    Backfill(#[from] BackfillError),

    #[error("optimization error: {0}")]
    Optimize(#[from] OptimizeError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Detect missing ranges for the configured window and collect them.
///
/// Progress and failure both flow through `sink`; `cancel` pauses the job at
/// the next batch boundary.
pub fn run_backfill(
    config: &JobConfig,
    exchange: &dyn ExchangeClient,
    store: &dyn MarketStore,
    sink: &dyn BackfillSink,
    cancel: Option<&AtomicBool>,
) -> Result<BackfillSummary, JobError> {
    let requested = config.requested_range();
    let existing = store.timestamps(&config.symbol)?;
    let ranges = find_missing_ranges(&requested, &existing);

    let coordinator = BackfillCoordinator::new(config.backfill_config());
    let records_written =
        coordinator.start(exchange, store, &config.symbol, &ranges, sink, cancel)?;

    Ok(BackfillSummary {
        symbol: config.symbol.clone(),
        ranges_detected: ranges.len(),
        records_written,
        final_state: coordinator.state(),
    })
}

/// Load the stored series for the configured window and grid-search it.
pub fn run_optimization(
    config: &JobConfig,
    store: &dyn MarketStore,
    progress: Option<&dyn Fn(&OptimizationProgress)>,
    cancel: Option<&AtomicBool>,
) -> Result<OptimizationReport, JobError> {
    let requested = config.requested_range();
    let series = store.query_by_symbol(
        &config.symbol,
        Some(requested.start_ms),
        Some(requested.end_ms),
    )?;

    let dataset_hash = hash_series(&series)?;

    let optimizer = Optimizer::new(ParameterGrid::default())
        .with_iteration_pause(Duration::from_millis(config.iteration_pause_ms));
    let baseline = OptimizationBaseline {
        parameters: Default::default(),
        win_rate: config.baseline_win_rate,
    };

    let started = Instant::now();
    let result = optimizer.optimize(&series, &baseline, progress, cancel)?;

    Ok(OptimizationReport {
        config_id: config.config_id(),
        symbol: config.symbol.clone(),
        series_len: series.len(),
        dataset_hash,
        baseline_win_rate: config.baseline_win_rate,
        result,
        elapsed_secs: started.elapsed().as_secs_f64(),
    })
}

fn hash_series(series: &[marketlab_core::domain::MarketDataPoint]) -> Result<String, JobError> {
    let bytes =
        serde_json::to_vec(series).map_err(|e| JobError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
