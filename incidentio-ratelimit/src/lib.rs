//! # Outbound rate limiting
//!
//! A single shared token bucket that throttles calls to a remote API.
//!
//! ## How It Works
//!
//! 1. The bucket starts full with `max_tokens` tokens
//! 2. Each outbound call consumes one token
//! 3. Tokens are added continuously at `refill_rate` per second, capped at `max_tokens`
//! 4. When the bucket is empty, [`RateLimiter::wait`] sleeps until the next token is due
//!
//! Up to `max_tokens` calls go through immediately; after that throughput is
//! capped at `refill_rate` calls per second. Waiters are not queued in order:
//! whoever re-checks first after a refill wins.
//!
//! ## Example
//!
//! ```rust
//! use incidentio_ratelimit::RateLimiter;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), incidentio_ratelimit::RateLimitError> {
//! let limiter = RateLimiter::new(100.0, 10.0);
//! let shutdown = CancellationToken::new();
//!
//! limiter.wait(&shutdown).await?;
//! // ... perform the call
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod token_bucket;

pub use error::{RateLimitError, RateLimitResult};
pub use token_bucket::{RateLimiter, RateLimiterStats};
