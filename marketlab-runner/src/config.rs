//! Serializable job configuration.

use chrono::NaiveDate;
use marketlab_core::backfill::BackfillConfig;
use marketlab_core::domain::{DateRange, DAY_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration for one backfill or optimization job.
///
/// Loadable from TOML; every field has a default so partial files work. The
/// requested window is `[start_date 00:00, end_date 24:00)` UTC — both dates
/// inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_requests_per_minute: u32,
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub iteration_pause_ms: u64,
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    /// Win rate the optimizer must beat; seeds its baseline.
    pub baseline_win_rate: f64,
}

impl Default for JobConfig {
    fn default() -> Self {
        let backfill = BackfillConfig::default();
        Self {
            symbol: "BTCUSDT".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date"),
            max_requests_per_minute: backfill.max_requests_per_minute,
            batch_size: backfill.batch_size,
            max_retries: backfill.max_retries,
            retry_delay_ms: backfill.retry_delay_ms,
            iteration_pause_ms: backfill.iteration_pause_ms,
            data_dir: PathBuf::from("data"),
            results_dir: PathBuf::from("results"),
            baseline_win_rate: 0.0,
        }
    }
}

impl JobConfig {
    /// Load from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let config: JobConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::BadDates {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// The requested collection window in epoch milliseconds.
    pub fn requested_range(&self) -> DateRange {
        let start_ms = self
            .start_date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
            .and_utc()
            .timestamp_millis();
        let end_ms = self
            .end_date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid")
            .and_utc()
            .timestamp_millis()
            + DAY_MS;
        DateRange::new(start_ms, end_ms)
    }

    /// The coordinator configuration carried by this job.
    pub fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig {
            batch_size: self.batch_size,
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            max_requests_per_minute: self.max_requests_per_minute,
            iteration_pause_ms: self.iteration_pause_ms,
            ..BackfillConfig::default()
        }
    }

    /// Deterministic content hash; identical configs share an id.
    pub fn config_id(&self) -> String {
        let json = serde_json::to_string(self).expect("JobConfig serialization cannot fail");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(String),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("start_date {start} is after end_date {end}")]
    BadDates { start: NaiveDate, end: NaiveDate },
}
