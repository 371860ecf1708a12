//! Health snapshot of the client's resilience components.

use crate::IncidentIoClient;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerHealth {
    pub state: String,
    pub failures: u32,
    pub successes: u32,
    pub requests: u32,
    pub consecutive_failures: u32,
    pub seconds_since_state_change: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds_since_last_failure: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterHealth {
    pub request_count: u64,
    pub throttled_count: u64,
    pub current_tokens: f64,
    pub max_tokens: f64,
    pub refill_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientHealth {
    /// `true` unless the circuit is open.
    pub healthy: bool,
    pub circuit_breaker: CircuitBreakerHealth,
    pub rate_limiter: RateLimiterHealth,
    pub cache_entries: usize,
}

impl IncidentIoClient {
    /// Snapshot breaker, limiter and cache state.
    pub fn health(&self) -> ClientHealth {
        let now = Instant::now();
        let breaker = self.executor().circuit_breaker().stats();
        let limiter = self.executor().rate_limiter().stats();

        ClientHealth {
            healthy: breaker.state != incidentio_http_client::CircuitState::Open,
            circuit_breaker: CircuitBreakerHealth {
                state: breaker.state.to_string(),
                failures: breaker.failures,
                successes: breaker.successes,
                requests: breaker.requests,
                consecutive_failures: breaker.consecutive_failures,
                seconds_since_state_change: now
                    .saturating_duration_since(breaker.last_state_change)
                    .as_secs_f64(),
                seconds_since_last_failure: breaker
                    .last_failure_at
                    .map(|at| now.saturating_duration_since(at).as_secs_f64()),
            },
            rate_limiter: RateLimiterHealth {
                request_count: limiter.request_count,
                throttled_count: limiter.throttled_count,
                current_tokens: limiter.current_tokens,
                max_tokens: limiter.max_tokens,
                refill_rate: limiter.refill_rate,
            },
            cache_entries: self.cache().len(),
        }
    }
}
