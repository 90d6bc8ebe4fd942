//! Historical backfill — fills missing sub-ranges of a stored series from an
//! exchange client, under a token-bucket rate limit, with resumable progress
//! and cooperative pause.

pub mod coordinator;
pub mod rate_limiter;

pub use coordinator::{
    BackfillConfig, BackfillCoordinator, BackfillError, BackfillEvent, BackfillSink,
    BackfillState, CollectionProgress, StdoutSink,
};
pub use rate_limiter::RateLimiter;
