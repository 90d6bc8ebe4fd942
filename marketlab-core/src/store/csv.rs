//! CSV-backed store — one file per symbol under a data directory.
//!
//! Layout: `{data_dir}/{SYMBOL}.csv` with `timestamp,price,volume` rows.
//! Writes are atomic (write to .tmp, rename into place) and the full series
//! for a symbol is kept in memory once touched, so reads after the first are
//! cheap. Durability beyond rewrite-on-batch is explicitly not a goal.

use super::{MarketStore, StoreError};
use crate::domain::MarketDataPoint;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type SymbolSeries = BTreeMap<i64, MarketDataPoint>;

/// CSV row shape, symbol implied by the file name.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CsvRow {
    timestamp: i64,
    price: f64,
    volume: f64,
}

/// File-per-symbol CSV store.
pub struct CsvStore {
    data_dir: PathBuf,
    cache: Mutex<HashMap<String, SymbolSeries>>,
}

impl CsvStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .map_err(|e| StoreError::Io(format!("create {}: {e}", data_dir.display())))?;
        Ok(Self {
            data_dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.data_dir.join(format!("{symbol}.csv"))
    }

    /// Symbols present on disk, sorted.
    pub fn symbols(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.data_dir)
            .map_err(|e| StoreError::Io(format!("read dir {}: {e}", self.data_dir.display())))?;
        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    /// Load a symbol's series into the cache if it isn't there yet.
    fn ensure_loaded<'a>(
        &self,
        cache: &'a mut HashMap<String, SymbolSeries>,
        symbol: &str,
    ) -> Result<&'a mut SymbolSeries, StoreError> {
        if !cache.contains_key(symbol) {
            let series = self.read_file(symbol)?;
            cache.insert(symbol.to_string(), series);
        }
        Ok(cache.get_mut(symbol).expect("just inserted"))
    }

    fn read_file(&self, symbol: &str) -> Result<SymbolSeries, StoreError> {
        let path = self.symbol_path(symbol);
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| StoreError::Io(format!("open {}: {e}", path.display())))?;
        let mut series = BTreeMap::new();
        for row in reader.deserialize() {
            let row: CsvRow = row.map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;
            series.insert(
                row.timestamp,
                MarketDataPoint {
                    timestamp: row.timestamp,
                    symbol: symbol.to_string(),
                    price: row.price,
                    volume: row.volume,
                },
            );
        }
        Ok(series)
    }

    /// Rewrite a symbol's file from its in-memory series, atomically.
    fn write_file(&self, symbol: &str, series: &SymbolSeries) -> Result<(), StoreError> {
        let path = self.symbol_path(symbol);
        let tmp_path = path.with_extension("csv.tmp");

        {
            let mut writer = csv::Writer::from_path(&tmp_path)
                .map_err(|e| StoreError::Write(format!("create {}: {e}", tmp_path.display())))?;
            for point in series.values() {
                writer
                    .serialize(CsvRow {
                        timestamp: point.timestamp,
                        price: point.price,
                        volume: point.volume,
                    })
                    .map_err(|e| StoreError::Write(format!("serialize row: {e}")))?;
            }
            writer
                .flush()
                .map_err(|e| StoreError::Write(format!("flush {}: {e}", tmp_path.display())))?;
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Write(format!("atomic rename failed: {e}"))
        })
    }
}

impl MarketStore for CsvStore {
    fn add(&self, point: &MarketDataPoint) -> Result<bool, StoreError> {
        Ok(self.add_batch(std::slice::from_ref(point))? == 1)
    }

    fn add_batch(&self, points: &[MarketDataPoint]) -> Result<usize, StoreError> {
        if points.is_empty() {
            return Ok(0);
        }
        let mut cache = self.cache.lock().unwrap();
        let mut inserted = 0;
        let mut touched: Vec<String> = Vec::new();

        for point in points {
            let series = self.ensure_loaded(&mut cache, &point.symbol)?;
            if !series.contains_key(&point.timestamp) {
                series.insert(point.timestamp, point.clone());
                inserted += 1;
                if !touched.contains(&point.symbol) {
                    touched.push(point.symbol.clone());
                }
            }
        }

        for symbol in touched {
            let series = cache.get(&symbol).expect("touched symbols are loaded");
            self.write_file(&symbol, series)?;
        }
        Ok(inserted)
    }

    fn query_by_symbol(
        &self,
        symbol: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
    ) -> Result<Vec<MarketDataPoint>, StoreError> {
        let mut cache = self.cache.lock().unwrap();
        let series = self.ensure_loaded(&mut cache, symbol)?;
        let start = start_ms.unwrap_or(i64::MIN);
        let end = end_ms.unwrap_or(i64::MAX);
        Ok(series.range(start..end).map(|(_, p)| p.clone()).collect())
    }

    fn oldest_and_newest(
        &self,
        symbol: &str,
    ) -> Result<(Option<MarketDataPoint>, Option<MarketDataPoint>), StoreError> {
        let mut cache = self.cache.lock().unwrap();
        let series = self.ensure_loaded(&mut cache, symbol)?;
        Ok((
            series.values().next().cloned(),
            series.values().next_back().cloned(),
        ))
    }

    fn timestamps(&self, symbol: &str) -> Result<Vec<i64>, StoreError> {
        let mut cache = self.cache.lock().unwrap();
        let series = self.ensure_loaded(&mut cache, symbol)?;
        Ok(series.keys().copied().collect())
    }

    fn count(&self, symbol: &str) -> Result<usize, StoreError> {
        let mut cache = self.cache.lock().unwrap();
        let series = self.ensure_loaded(&mut cache, symbol)?;
        Ok(series.len())
    }
}
