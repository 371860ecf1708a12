//! Circuit breaker pattern implementation.

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, requests are allowed.
    Closed,
    /// Circuit is open, requests are rejected.
    Open,
    /// Circuit is half-open, limited requests are allowed for testing.
    HalfOpen,
}

impl CircuitState {
    /// Lowercase name used in logs and health reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub max_failures: u32,
    /// Failure rate (0-1) that opens the circuit once `min_requests` is reached.
    pub failure_threshold: f64,
    /// Requests needed before the failure rate is considered.
    pub min_requests: u32,
    /// Time to stay open before admitting trial requests.
    pub timeout: Duration,
    /// Trial requests admitted (and successes needed) while half-open.
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            failure_threshold: 0.5,
            min_requests: 10,
            timeout: Duration::from_secs(30),
            half_open_max_requests: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new circuit breaker config.
    pub fn new(max_failures: u32, timeout: Duration) -> Self {
        Self {
            max_failures,
            timeout,
            ..Default::default()
        }
    }

    /// Set the failure rate that opens the circuit.
    pub fn with_failure_threshold(mut self, threshold: f64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the minimum number of requests before the rate is evaluated.
    pub fn with_min_requests(mut self, count: u32) -> Self {
        self.min_requests = count;
        self
    }

    /// Set the number of half-open trial requests.
    pub fn with_half_open_requests(mut self, count: u32) -> Self {
        self.half_open_max_requests = count;
        self
    }
}

/// Errors returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the operation was not invoked.
    #[error("circuit breaker is open")]
    Open,
    /// The circuit is half-open and every trial slot is taken.
    #[error("too many requests while circuit breaker is half-open")]
    TooManyRequests,
    /// The operation ran and failed.
    #[error("{0}")]
    Inner(E),
}

/// Read-only snapshot of the breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failures: u32,
    pub successes: u32,
    pub requests: u32,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<Instant>,
    pub last_state_change: Instant,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { opened_at: Instant },
    HalfOpen { admitted: u32, succeeded: u32 },
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    failures: u32,
    successes: u32,
    requests: u32,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    last_state_change: Instant,
    /// Bumped on every transition; results of calls admitted under an older
    /// epoch are discarded.
    epoch: u64,
}

impl Inner {
    fn state(&self) -> CircuitState {
        match self.phase {
            Phase::Closed => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    fn transition(&mut self, phase: Phase, now: Instant) {
        self.phase = phase;
        self.last_state_change = now;
        self.epoch += 1;

        if matches!(phase, Phase::Closed) {
            self.failures = 0;
            self.successes = 0;
            self.requests = 0;
            self.consecutive_failures = 0;
        }
    }
}

/// Circuit breaker guarding calls to one remote dependency.
///
/// All bookkeeping happens under a single mutex that is never held while the
/// guarded operation runs.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    /// Create a new, closed circuit breaker.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                failures: 0,
                successes: 0,
                requests: 0,
                consecutive_failures: 0,
                last_failure_at: None,
                last_state_change: Instant::now(),
                epoch: 0,
            }),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Run `operation` if the breaker admits it, and record its outcome.
    ///
    /// `Ok` counts as success and `Err` as failure. If the returned future is
    /// dropped before `operation` completes, nothing is recorded and any
    /// half-open slot it held is released.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let admission = self.admit()?;

        match operation().await {
            Ok(value) => {
                admission.record(true);
                Ok(value)
            }
            Err(error) => {
                admission.record(false);
                Err(CircuitBreakerError::Inner(error))
            }
        }
    }

    /// Get the current circuit state.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state()
    }

    /// Snapshot counters and state.
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        CircuitBreakerStats {
            state: inner.state(),
            failures: inner.failures,
            successes: inner.successes,
            requests: inner.requests,
            consecutive_failures: inner.consecutive_failures,
            last_failure_at: inner.last_failure_at,
            last_state_change: inner.last_state_change,
        }
    }

    /// Force the breaker closed and zero its counters.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.transition(Phase::Closed, Instant::now());
        info!("Circuit breaker reset");
    }

    fn admit<E>(&self) -> Result<Admission<'_>, CircuitBreakerError<E>> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        match inner.phase {
            Phase::Closed => {}
            Phase::Open { opened_at } => {
                if now.saturating_duration_since(opened_at) <= self.config.timeout {
                    return Err(CircuitBreakerError::Open);
                }
                debug!("Circuit breaker transitioning to half-open");
                inner.transition(
                    Phase::HalfOpen {
                        admitted: 1,
                        succeeded: 0,
                    },
                    now,
                );
            }
            Phase::HalfOpen { admitted, succeeded } => {
                if admitted >= self.config.half_open_max_requests {
                    return Err(CircuitBreakerError::TooManyRequests);
                }
                inner.phase = Phase::HalfOpen {
                    admitted: admitted + 1,
                    succeeded,
                };
            }
        }

        inner.requests += 1;

        Ok(Admission {
            breaker: self,
            epoch: inner.epoch,
            settled: false,
        })
    }

    fn on_success(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return;
        }

        inner.successes += 1;
        inner.consecutive_failures = 0;

        if let Phase::HalfOpen { admitted, succeeded } = inner.phase {
            let succeeded = succeeded + 1;
            if succeeded >= self.config.half_open_max_requests {
                info!("Circuit breaker closing");
                inner.transition(Phase::Closed, Instant::now());
            } else {
                inner.phase = Phase::HalfOpen { admitted, succeeded };
            }
        }
    }

    fn on_failure(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return;
        }

        let now = Instant::now();
        inner.failures += 1;
        inner.consecutive_failures += 1;
        inner.last_failure_at = Some(now);

        match inner.phase {
            Phase::Closed if self.should_open(&inner) => {
                warn!(
                    failures = inner.failures,
                    requests = inner.requests,
                    consecutive_failures = inner.consecutive_failures,
                    "Circuit breaker opening"
                );
                inner.transition(Phase::Open { opened_at: now }, now);
            }
            Phase::HalfOpen { .. } => {
                warn!("Trial request failed, circuit breaker reopening");
                inner.transition(Phase::Open { opened_at: now }, now);
            }
            _ => {}
        }
    }

    fn on_abandoned(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return;
        }

        inner.requests = inner.requests.saturating_sub(1);
        if let Phase::HalfOpen { admitted, succeeded } = inner.phase {
            inner.phase = Phase::HalfOpen {
                admitted: admitted.saturating_sub(1),
                succeeded,
            };
        }
    }

    fn should_open(&self, inner: &Inner) -> bool {
        if inner.consecutive_failures >= self.config.max_failures {
            return true;
        }

        inner.requests >= self.config.min_requests
            && inner.requests > 0
            && f64::from(inner.failures) / f64::from(inner.requests)
                >= self.config.failure_threshold
    }
}

/// An admitted call. Dropping it unrecorded gives the slot back.
struct Admission<'a> {
    breaker: &'a CircuitBreaker,
    epoch: u64,
    settled: bool,
}

impl Admission<'_> {
    fn record(mut self, success: bool) {
        self.settled = true;
        if success {
            self.breaker.on_success(self.epoch);
        } else {
            self.breaker.on_failure(self.epoch);
        }
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_abandoned(self.epoch);
        }
    }
}
