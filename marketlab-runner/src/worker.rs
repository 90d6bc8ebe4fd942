//! Background worker thread — jobs run here, off the caller's thread.
//!
//! Communication with the caller is via `mpsc` channels; the shared cancel
//! flag is the cooperative stop signal. Commands are processed one at a time,
//! which is also what enforces the one-job-per-process rule: a second job
//! cannot start until the first one's loop has yielded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use marketlab_core::backfill::{BackfillEvent, BackfillSink};
use marketlab_core::exchange::SimulatedExchange;
use marketlab_core::optimize::OptimizationProgress;
use marketlab_core::store::CsvStore;

use crate::config::JobConfig;
use crate::jobs::{run_backfill, run_optimization, BackfillSummary, OptimizationReport};

/// Commands sent from the caller to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Backfill {
        config: JobConfig,
        /// Seed for the simulated exchange backing the job.
        exchange_seed: u64,
    },
    Optimize {
        config: JobConfig,
    },
    Shutdown,
}

/// Responses sent from the worker back to the caller.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Backfill(BackfillEvent),
    BackfillDone(BackfillSummary),
    OptimizeProgress(OptimizationProgress),
    OptimizeDone(Box<OptimizationReport>),
    JobFailed { error: String },
}

/// Spawn the background worker thread.
///
/// Callers keep a clone of `cancel` and set it to stop the in-flight job at
/// its next batch or trial boundary.
pub fn spawn_worker(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name("marketlab-worker".into())
        .spawn(move || worker_loop(rx, tx, cancel))
        .expect("failed to spawn worker thread")
}

fn worker_loop(rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>, cancel: Arc<AtomicBool>) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                cancel.store(false, Ordering::Relaxed);
                handle_command(cmd, &tx, &cancel);
            }
        }
    }
}

fn handle_command(cmd: WorkerCommand, tx: &Sender<WorkerResponse>, cancel: &Arc<AtomicBool>) {
    match cmd {
        WorkerCommand::Backfill {
            config,
            exchange_seed,
        } => handle_backfill(config, exchange_seed, tx, cancel),
        WorkerCommand::Optimize { config } => handle_optimize(config, tx, cancel),
        WorkerCommand::Shutdown => {} // handled in the loop
    }
}

fn handle_backfill(
    config: JobConfig,
    exchange_seed: u64,
    tx: &Sender<WorkerResponse>,
    cancel: &Arc<AtomicBool>,
) {
    let store = match CsvStore::open(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            let _ = tx.send(WorkerResponse::JobFailed {
                error: e.to_string(),
            });
            return;
        }
    };
    let exchange = SimulatedExchange::new(exchange_seed);
    let sink = ChannelSink { tx: tx.clone() };

    match run_backfill(&config, &exchange, &store, &sink, Some(cancel.as_ref())) {
        Ok(summary) => {
            let _ = tx.send(WorkerResponse::BackfillDone(summary));
        }
        Err(e) => {
            let _ = tx.send(WorkerResponse::JobFailed {
                error: e.to_string(),
            });
        }
    }
}

fn handle_optimize(config: JobConfig, tx: &Sender<WorkerResponse>, cancel: &Arc<AtomicBool>) {
    let store = match CsvStore::open(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            let _ = tx.send(WorkerResponse::JobFailed {
                error: e.to_string(),
            });
            return;
        }
    };

    let tx_progress = tx.clone();
    let progress_cb = move |progress: &OptimizationProgress| {
        let _ = tx_progress.send(WorkerResponse::OptimizeProgress(progress.clone()));
    };

    match run_optimization(&config, &store, Some(&progress_cb), Some(cancel.as_ref())) {
        Ok(report) => {
            let _ = tx.send(WorkerResponse::OptimizeDone(Box::new(report)));
        }
        Err(e) => {
            let _ = tx.send(WorkerResponse::JobFailed {
                error: e.to_string(),
            });
        }
    }
}

/// BackfillSink implementation that forwards events through the channel.
struct ChannelSink {
    tx: Sender<WorkerResponse>,
}

impl BackfillSink for ChannelSink {
    fn event(&self, event: &BackfillEvent) {
        let _ = self.tx.send(WorkerResponse::Backfill(event.clone()));
    }
}
