//! Token-bucket admission control.
//!
//! The bucket holds at most `burst` tokens and refills continuously at
//! `rate` tokens per second. Each admitted request takes one token; a
//! request that finds the bucket below one token is rejected. The bucket
//! starts full, so a fresh process admits `burst` requests back to back.
//!
//! Time comes from [`tokio::time::Instant`], which lets tests drive the
//! refill with a paused clock.

use std::sync::{Mutex, PoisonError};

use tokio::time::Instant;

/// Refill rate used when none is configured, in tokens per second.
pub const DEFAULT_RATE_PER_SEC: f64 = 1.0;
/// Bucket capacity used when none is configured.
pub const DEFAULT_BURST: u32 = 3;

/// A process-wide request limiter, shared by every connection task.
#[derive(Debug)]
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

impl RateLimiter {
    /// `rate_per_sec` must be positive and finite and `burst` at least 1;
    /// configuration loading enforces both.
    pub fn new(rate_per_sec: f64, burst: u32) -> Self {
        let burst = f64::from(burst);
        Self {
            rate: rate_per_sec,
            burst,
            bucket: Mutex::new(Bucket { tokens: burst, last: Instant::now() }),
        }
    }

    /// Takes one token if available. Never blocks on time, only on the
    /// bucket's mutex for the few instructions of the refill arithmetic.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        // The critical section cannot panic, so a poisoned lock still holds
        // a consistent bucket.
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.saturating_duration_since(bucket.last).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
        bucket.last = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PER_SEC, DEFAULT_BURST)
    }
}
