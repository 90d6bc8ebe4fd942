//! In-memory store — the reference `MarketStore` used by tests and demos.

use super::{MarketStore, StoreError};
use crate::domain::MarketDataPoint;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type SymbolSeries = BTreeMap<i64, MarketDataPoint>;

/// In-memory time-series store, one ordered map per symbol.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, SymbolSeries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols with at least one stored point, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut symbols: Vec<String> = inner
            .iter()
            .filter(|(_, series)| !series.is_empty())
            .map(|(s, _)| s.clone())
            .collect();
        symbols.sort();
        symbols
    }
}

impl MarketStore for MemoryStore {
    fn add(&self, point: &MarketDataPoint) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let series = inner.entry(point.symbol.clone()).or_default();
        if series.contains_key(&point.timestamp) {
            return Ok(false);
        }
        series.insert(point.timestamp, point.clone());
        Ok(true)
    }

    fn add_batch(&self, points: &[MarketDataPoint]) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let mut inserted = 0;
        for point in points {
            let series = inner.entry(point.symbol.clone()).or_default();
            if !series.contains_key(&point.timestamp) {
                series.insert(point.timestamp, point.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn query_by_symbol(
        &self,
        symbol: &str,
        start_ms: Option<i64>,
        end_ms: Option<i64>,
    ) -> Result<Vec<MarketDataPoint>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let Some(series) = inner.get(symbol) else {
            return Ok(Vec::new());
        };
        let start = start_ms.unwrap_or(i64::MIN);
        let end = end_ms.unwrap_or(i64::MAX);
        Ok(series.range(start..end).map(|(_, p)| p.clone()).collect())
    }

    fn oldest_and_newest(
        &self,
        symbol: &str,
    ) -> Result<(Option<MarketDataPoint>, Option<MarketDataPoint>), StoreError> {
        let inner = self.inner.lock().unwrap();
        let Some(series) = inner.get(symbol) else {
            return Ok((None, None));
        };
        let oldest = series.values().next().cloned();
        let newest = series.values().next_back().cloned();
        Ok((oldest, newest))
    }

    fn timestamps(&self, symbol: &str) -> Result<Vec<i64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .get(symbol)
            .map(|series| series.keys().copied().collect())
            .unwrap_or_default())
    }

    fn count(&self, symbol: &str) -> Result<usize, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.get(symbol).map(|series| series.len()).unwrap_or(0))
    }
}
