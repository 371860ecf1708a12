//! Token Bucket Algorithm
//!
//! Smooth rate limiting with burst capacity. Tokens are added at a constant
//! rate and consumed on each outbound request.
//!
//! ## Example
//!
//! ```rust
//! use incidentio_ratelimit::RateLimiter;
//!
//! let limiter = RateLimiter::new(10.0, 1.0); // 10 capacity, 1 token/sec refill
//!
//! // First 10 requests succeed (burst)
//! for _ in 0..10 {
//!     assert!(limiter.try_acquire());
//! }
//!
//! // 11th request is throttled (bucket empty)
//! assert!(!limiter.try_acquire());
//! ```

use crate::error::{RateLimitError, RateLimitResult};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Token accounting, guarded by a single mutex.
#[derive(Debug)]
struct BucketState {
    /// Current number of tokens
    tokens: f64,
    /// Last time tokens were added
    last_refill: Instant,
    /// Every acquisition attempt
    request_count: u64,
    /// Attempts that found the bucket empty
    throttled_count: u64,
}

/// Point-in-time view of the limiter, for observability.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterStats {
    /// Total acquisition attempts
    pub request_count: u64,
    /// Attempts that had to wait
    pub throttled_count: u64,
    /// Tokens in the bucket when the snapshot was taken
    pub current_tokens: f64,
    /// Bucket capacity
    pub max_tokens: f64,
    /// Tokens added per second
    pub refill_rate: f64,
}

/// Shared token bucket rate limiter.
///
/// One instance is created per remote dependency and shared by every caller.
/// Only token bookkeeping happens under the lock; sleeping happens outside it.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens (burst capacity)
    max_tokens: f64,
    /// Tokens added per second
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Create a new, full token bucket.
    ///
    /// # Arguments
    ///
    /// * `max_tokens` - Maximum tokens (burst capacity)
    /// * `refill_rate` - Tokens added per second
    ///
    /// # Panics
    ///
    /// Panics if `max_tokens` is below 1 or `refill_rate` is not positive
    pub fn new(max_tokens: f64, refill_rate: f64) -> Self {
        assert!(max_tokens >= 1.0, "Capacity must be at least 1 token");
        assert!(refill_rate > 0.0, "Refill rate must be greater than 0");

        Self {
            max_tokens,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
                request_count: 0,
                throttled_count: 0,
            }),
        }
    }

    /// Block until a token is available or `cancel` fires.
    ///
    /// Cancellation always wins: an already-cancelled token returns
    /// [`RateLimitError::Cancelled`] without consuming a token.
    pub async fn wait(&self, cancel: &CancellationToken) -> RateLimitResult<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(RateLimitError::Cancelled);
            }

            let delay = match self.acquire_or_delay() {
                None => return Ok(()),
                Some(delay) => delay,
            };

            trace!(delay_ms = delay.as_millis() as u64, "rate limited, waiting for token");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("rate limiter wait cancelled");
                    return Err(RateLimitError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Try to take a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.acquire_or_delay().is_none()
    }

    /// Snapshot the limiter's counters.
    pub fn stats(&self) -> RateLimiterStats {
        let mut state = self.state.lock();
        self.refill(&mut state);

        RateLimiterStats {
            request_count: state.request_count,
            throttled_count: state.throttled_count,
            current_tokens: state.tokens,
            max_tokens: self.max_tokens,
            refill_rate: self.refill_rate,
        }
    }

    /// Get the capacity
    pub fn max_tokens(&self) -> f64 {
        self.max_tokens
    }

    /// Get the refill rate
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Take a token, or report how long until the next one is due.
    fn acquire_or_delay(&self) -> Option<Duration> {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.request_count += 1;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return None;
        }

        state.throttled_count += 1;
        let seconds = (1.0 - state.tokens) / self.refill_rate;
        Some(Duration::from_secs_f64(seconds))
    }

    /// Refill tokens based on elapsed time (lock held by caller)
    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();

        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        state.last_refill = now;
    }
}
