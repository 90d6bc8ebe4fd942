//! Exchange client trait and structured error types.
//!
//! The trait abstracts over candle sources so the backfill coordinator can be
//! driven by a real venue, the deterministic simulator, or a scripted mock in
//! tests. Numeric candle fields arrive as strings, exactly as exchange REST
//! payloads carry them; the coordinator parses them.

pub mod sim;

pub use sim::SimulatedExchange;

use thiserror::Error;

/// One OHLCV candle as delivered by an exchange, reduced to the fields the
/// collector consumes. `close` and `volume` are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candle {
    /// Candle open time, milliseconds since the Unix epoch.
    pub open_time: i64,
    pub close: String,
    pub volume: String,
}

/// Candle sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleInterval {
    OneMinute,
    OneHour,
    OneDay,
}

impl CandleInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::OneHour => "1h",
            CandleInterval::OneDay => "1d",
        }
    }

    pub fn ms(&self) -> i64 {
        match self {
            CandleInterval::OneMinute => 60_000,
            CandleInterval::OneHour => 3_600_000,
            CandleInterval::OneDay => 86_400_000,
        }
    }
}

/// Structured error types for exchange fetches.
///
/// Rate-limit and network failures are transient and retried by the
/// coordinator; the rest surface immediately.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited by exchange (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("network unreachable: {0}")]
    Network(String),

    #[error("malformed exchange response: {0}")]
    InvalidResponse(String),

    #[error("exchange rejected the API credentials")]
    CredentialsRejected,
}

impl FetchError {
    /// Whether the coordinator should retry after a fixed delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. } | FetchError::Network(_))
    }
}

/// Trait for exchange clients.
pub trait ExchangeClient: Send + Sync {
    /// Human-readable name of this client.
    fn name(&self) -> &str;

    /// Fetch candles for `symbol` with open times in `[start_ms, end_ms)`.
    fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, FetchError>;

    /// Check whether the configured API credentials are accepted.
    fn validate_credentials(&self) -> Result<bool, FetchError>;
}
