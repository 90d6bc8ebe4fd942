//! MarketLab CLI — backfill, optimize and status commands.
//!
//! Commands:
//! - `backfill` — detect and fill gaps in the stored series for a symbol
//! - `optimize` — grid-search strategy parameters over the stored series
//! - `status` — report stored coverage and remaining gaps per symbol

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use marketlab_core::backfill::StdoutSink;
use marketlab_core::domain::format_ms;
use marketlab_core::exchange::{ExchangeClient, SimulatedExchange};
use marketlab_core::gaps::find_missing_ranges;
use marketlab_core::optimize::{OptimizationProgress, OptimizationStage};
use marketlab_core::store::{CsvStore, MarketStore};
use marketlab_runner::{run_backfill, run_optimization, save_report, JobConfig};

#[derive(Parser)]
#[command(name = "marketlab", about = "MarketLab CLI — backfill and strategy optimization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect and fill gaps in the stored series for a symbol.
    Backfill {
        /// Symbol to collect (e.g. BTCUSDT).
        symbol: String,

        /// Start date (YYYY-MM-DD). Defaults to 30 days before the end date.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), inclusive. Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Exchange requests allowed per minute.
        #[arg(long, default_value_t = 60)]
        max_rpm: u32,

        /// Seed for the simulated exchange.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Grid-search strategy parameters over the stored series.
    Optimize {
        /// Symbol to optimize.
        symbol: String,

        /// Start date (YYYY-MM-DD). Defaults to 30 days before the end date.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), inclusive. Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Win rate the search must beat.
        #[arg(long, default_value_t = 0.0)]
        baseline_win_rate: f64,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output directory for the report JSON.
        #[arg(long, default_value = "results")]
        results_dir: PathBuf,
    },
    /// Report stored coverage and remaining gaps per symbol.
    Status {
        /// Symbols to inspect. Defaults to everything in the store.
        symbols: Vec<String>,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Backfill {
            symbol,
            start,
            end,
            max_rpm,
            seed,
            data_dir,
        } => cmd_backfill(symbol, start, end, max_rpm, seed, data_dir),
        Commands::Optimize {
            symbol,
            start,
            end,
            baseline_win_rate,
            data_dir,
            results_dir,
        } => cmd_optimize(symbol, start, end, baseline_win_rate, data_dir, results_dir),
        Commands::Status { symbols, data_dir } => cmd_status(symbols, data_dir),
    }
}

fn parse_window(start: Option<String>, end: Option<String>) -> Result<(NaiveDate, NaiveDate)> {
    let end_date = match end {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("invalid end date '{s}'"))?,
        None => chrono::Utc::now().date_naive(),
    };
    let start_date = match start {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .with_context(|| format!("invalid start date '{s}'"))?,
        None => end_date - chrono::Duration::days(30),
    };
    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }
    Ok((start_date, end_date))
}

fn cmd_backfill(
    symbol: String,
    start: Option<String>,
    end: Option<String>,
    max_rpm: u32,
    seed: u64,
    data_dir: PathBuf,
) -> Result<()> {
    let (start_date, end_date) = parse_window(start, end)?;
    let config = JobConfig {
        symbol: symbol.clone(),
        start_date,
        end_date,
        max_requests_per_minute: max_rpm,
        data_dir: data_dir.clone(),
        ..JobConfig::default()
    };
    config.validate()?;

    let store = CsvStore::open(&data_dir)?;
    let exchange = SimulatedExchange::new(seed);
    if !exchange.validate_credentials()? {
        bail!("exchange rejected the configured credentials");
    }

    println!("Backfilling {symbol} from {start_date} to {end_date} (inclusive)...");
    let summary = run_backfill(&config, &exchange, &store, &StdoutSink::new(), None)?;

    println!(
        "{}: {} gap(s) detected, {} record(s) written, final state {:?}",
        summary.symbol, summary.ranges_detected, summary.records_written, summary.final_state
    );
    Ok(())
}

fn cmd_optimize(
    symbol: String,
    start: Option<String>,
    end: Option<String>,
    baseline_win_rate: f64,
    data_dir: PathBuf,
    results_dir: PathBuf,
) -> Result<()> {
    let (start_date, end_date) = parse_window(start, end)?;
    let config = JobConfig {
        symbol: symbol.clone(),
        start_date,
        end_date,
        baseline_win_rate,
        data_dir: data_dir.clone(),
        results_dir: results_dir.clone(),
        ..JobConfig::default()
    };
    config.validate()?;

    let store = CsvStore::open(&data_dir)?;
    let progress = ThrottledProgress::new(Duration::from_millis(500));
    let progress_cb = |p: &OptimizationProgress| progress.report(p);

    println!("Optimizing {symbol} over {start_date}..{end_date} (baseline win rate {baseline_win_rate:.1}%)...");
    let report = run_optimization(&config, &store, Some(&progress_cb), None)?;

    println!(
        "\nBest: win rate {:.2}%, profit factor {:.2} over {} point(s)",
        report.result.win_rate, report.result.profit_factor, report.series_len
    );
    println!(
        "Parameters: {}",
        serde_json::to_string_pretty(&report.result.parameters)?
    );

    let path = save_report(&report, &results_dir)?;
    println!("Report written to {}", path.display());
    Ok(())
}

fn cmd_status(symbols: Vec<String>, data_dir: PathBuf) -> Result<()> {
    let store = CsvStore::open(&data_dir)?;
    let symbols = if symbols.is_empty() {
        store.symbols()?
    } else {
        symbols
    };
    if symbols.is_empty() {
        println!("Store at {} is empty", data_dir.display());
        return Ok(());
    }

    for symbol in symbols {
        let count = store.count(&symbol)?;
        let (oldest, newest) = store.oldest_and_newest(&symbol)?;
        match (oldest, newest) {
            (Some(oldest), Some(newest)) => {
                let coverage = marketlab_core::domain::DateRange::new(
                    oldest.timestamp,
                    newest.timestamp + marketlab_core::gaps::SAMPLE_INTERVAL_MS,
                );
                let gaps = find_missing_ranges(&coverage, &store.timestamps(&symbol)?);
                println!(
                    "{symbol}: {count} point(s), {} .. {}, {} internal gap(s)",
                    format_ms(oldest.timestamp),
                    format_ms(newest.timestamp),
                    gaps.len()
                );
                for gap in gaps.iter().take(5) {
                    println!("  missing {gap}");
                }
                if gaps.len() > 5 {
                    println!("  ... and {} more", gaps.len() - 5);
                }
            }
            _ => println!("{symbol}: no data"),
        }
    }
    Ok(())
}

/// Prints optimizer progress at most every `interval`, plus stage changes.
struct ThrottledProgress {
    interval: Duration,
    state: Mutex<(Option<Instant>, Option<OptimizationStage>)>,
}

impl ThrottledProgress {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new((None, None)),
        }
    }

    fn report(&self, p: &OptimizationProgress) {
        let mut state = self.state.lock().unwrap();
        let stage_changed = state.1 != Some(p.stage);
        let throttled = state
            .0
            .map(|last| last.elapsed() < self.interval)
            .unwrap_or(false);
        if !stage_changed && throttled {
            return;
        }
        *state = (Some(Instant::now()), Some(p.stage));

        match p.stage {
            OptimizationStage::Init => println!("Preparing optimization..."),
            OptimizationStage::ParameterTuning => {
                println!("Searching {} parameter combination(s)...", p.total)
            }
            OptimizationStage::Backtesting => println!(
                "[{}/{}] best win rate {:.2}% (pf {:.2}), eta {}s",
                p.tested, p.total, p.best_win_rate, p.best_profit_factor, p.eta_secs
            ),
            OptimizationStage::Validation => {
                println!("[{}/{}] validating promising parameters...", p.tested, p.total)
            }
        }
    }
}
