//! Token-bucket rate limiter for exchange requests.
//!
//! Capacity is the maximum requests per minute; one token refills every
//! `60_000 / max_rpm` milliseconds. `acquire` blocks the calling thread until
//! a token is available — the backfill loop is the only caller, so sleeping
//! here is the intended pacing mechanism.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Blocking token bucket.
#[derive(Debug)]
pub struct RateLimiter {
    max_tokens: u32,
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Bucket sized for `max_rpm` requests per minute.
    pub fn per_minute(max_rpm: u32) -> Self {
        assert!(max_rpm >= 1, "rate limit must allow at least one request");
        Self::new(max_rpm, Duration::from_millis(60_000 / max_rpm as u64))
    }

    /// Bucket with explicit capacity and refill interval (used by tests).
    pub fn new(max_tokens: u32, refill_interval: Duration) -> Self {
        Self {
            max_tokens,
            refill_interval,
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take a token, sleeping until one refills if the bucket is empty.
    pub fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => std::thread::sleep(wait),
            }
        }
    }

    /// Take a token without blocking; on failure returns how long to wait
    /// before the next refill.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().unwrap();
        self.refill(&mut state);
        if state.tokens > 0 {
            state.tokens -= 1;
            Ok(())
        } else {
            let since_refill = state.last_refill.elapsed();
            Err(self
                .refill_interval
                .checked_sub(since_refill)
                .unwrap_or(self.refill_interval))
        }
    }

    /// Tokens currently available.
    pub fn available(&self) -> u32 {
        let mut state = self.state.lock().unwrap();
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let elapsed = state.last_refill.elapsed();
        let new_tokens = (elapsed.as_millis() / self.refill_interval.as_millis().max(1)) as u32;
        if new_tokens > 0 {
            state.tokens = (state.tokens + new_tokens).min(self.max_tokens);
            state.last_refill = Instant::now();
        }
    }
}
