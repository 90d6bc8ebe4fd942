//! MarketLab Runner — job orchestration on top of `marketlab-core`.
//!
//! This crate provides:
//! - Serializable job configuration (TOML) with a content-addressed id
//! - Backfill and optimization jobs wiring store, exchange and engine together
//! - Report export (pretty JSON with a dataset hash)
//! - A background worker thread with mpsc command/response channels

pub mod config;
pub mod export;
pub mod jobs;
pub mod worker;

pub use config::{ConfigError, JobConfig};
pub use export::save_report;
pub use jobs::{run_backfill, run_optimization, BackfillSummary, JobError, OptimizationReport};
pub use worker::{spawn_worker, WorkerCommand, WorkerResponse};
