//! Retry policy with exponential backoff.

use rand::Rng;
use std::collections::BTreeSet;
use std::time::Duration;

/// Status codes retried by default.
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Immutable retry policy shared by every request of an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any delay.
    pub max_backoff: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Status codes that trigger a retry.
    pub retryable_status_codes: BTreeSet<u16>,
    /// Fraction of the delay to randomize by (0 disables jitter).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
            jitter: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Create an exponential policy with the default status codes.
    pub fn exponential(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            ..Default::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set the maximum delay.
    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    /// Set the growth factor.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Replace the retryable status codes.
    pub fn with_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Randomize each delay by up to `fraction` of its value, in either direction.
    pub fn with_jitter(mut self, fraction: f64) -> Self {
        self.jitter = fraction.clamp(0.0, 1.0);
        self
    }

    /// Decide whether a failed attempt should be retried.
    ///
    /// Transport-level errors are always retried; otherwise only the
    /// configured status codes are.
    pub fn should_retry(&self, status: Option<u16>, transport_error: bool) -> bool {
        if transport_error {
            return true;
        }
        status.is_some_and(|status| self.retryable_status_codes.contains(&status))
    }

    /// Delay before the retry that follows `attempt` (0-indexed).
    ///
    /// `initial_backoff * multiplier^attempt`, capped at `max_backoff`.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        let max = self.max_backoff.as_secs_f64();

        let mut seconds = if base.is_finite() { base.clamp(0.0, max) } else { max };

        if self.jitter > 0.0 && seconds > 0.0 {
            let spread = seconds * self.jitter.min(1.0);
            seconds += rand::thread_rng().gen_range(-spread..=spread);
            seconds = seconds.clamp(0.0, max);
        }

        Duration::try_from_secs_f64(seconds).unwrap_or(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_status_codes() {
        let policy = RetryPolicy::default();

        for status in [408, 429, 500, 502, 503, 504] {
            assert!(policy.should_retry(Some(status), false), "{}", status);
        }
        for status in [200, 400, 401, 403, 404, 422] {
            assert!(!policy.should_retry(Some(status), false), "{}", status);
        }
    }

    #[test]
    fn test_should_retry_transport_error() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(None, true));
        assert!(!policy.should_retry(None, false));
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(100));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(400));
        assert_eq!(policy.calculate_backoff(3), Duration::from_millis(800));
        assert_eq!(policy.calculate_backoff(10), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_never_exceeds_max() {
        let policy = RetryPolicy::default().with_jitter(0.5);

        for attempt in 0..200 {
            assert!(policy.calculate_backoff(attempt) <= policy.max_backoff);
        }
    }

    #[test]
    fn test_backoff_with_out_of_range_fields() {
        let negative = RetryPolicy {
            multiplier: -2.0,
            ..Default::default()
        };
        for attempt in 0..8 {
            assert!(negative.calculate_backoff(attempt) <= negative.max_backoff);
        }
        assert_eq!(negative.calculate_backoff(1), Duration::ZERO);

        let nan = RetryPolicy {
            multiplier: f64::NAN,
            jitter: f64::INFINITY,
            ..Default::default()
        };
        assert!(nan.calculate_backoff(2) <= nan.max_backoff);

        let negative_jitter = RetryPolicy::default().with_jitter(-0.5);
        assert_eq!(negative_jitter.calculate_backoff(0), Duration::from_millis(100));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::exponential(3, Duration::from_secs(1)).with_jitter(0.25);

        for _ in 0..100 {
            let delay = policy.calculate_backoff(0);
            assert!(delay >= Duration::from_millis(750), "{:?}", delay);
            assert!(delay <= Duration::from_millis(1250), "{:?}", delay);
        }
    }

    #[test]
    fn test_custom_status_codes() {
        let policy = RetryPolicy::default().with_status_codes([409]);
        assert!(policy.should_retry(Some(409), false));
        assert!(!policy.should_retry(Some(503), false));
    }
}
