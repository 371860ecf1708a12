//! Request executor: rate limit, circuit breaker and retry around one transport.

use crate::{
    ApiRequest, ApiResponse, CircuitBreaker, CircuitBreakerError, HttpClientError, Result,
    RetryPolicy, Transport, TransportRequest, TransportResponse,
};
use incidentio_ratelimit::RateLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Runs [`ApiRequest`]s through the resilience pipeline.
///
/// For every attempt: take a rate-limit token, then send through the circuit
/// breaker. Failed attempts are retried with exponential backoff when the
/// retry policy allows it. The limiter and breaker are shared, so every
/// caller of one executor counts against the same budget.
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    rate_limiter: Arc<RateLimiter>,
    circuit_breaker: Arc<CircuitBreaker>,
    retry_policy: RetryPolicy,
    base_url: String,
    timeout: Duration,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("retry_policy", &self.retry_policy)
            .field("timeout", &self.timeout)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Start building an executor for `base_url`.
    pub fn builder(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> RequestExecutorBuilder {
        RequestExecutorBuilder {
            transport,
            base_url: base_url.into(),
            rate_limiter: None,
            circuit_breaker: None,
            retry_policy: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
            deadline: None,
        }
    }

    /// Get the shared rate limiter.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Get the shared circuit breaker.
    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    /// Get the retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Get the default base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute `request`, retrying transient failures.
    ///
    /// Returns the first 2xx response, or a terminal error once the request
    /// is rejected, not retryable, out of retries, cancelled or past its
    /// deadline.
    pub async fn execute(&self, request: ApiRequest, cancel: &CancellationToken) -> Result<ApiResponse> {
        let prepared = TransportRequest {
            method: request.method().clone(),
            url: request.build_url(&self.base_url)?,
            headers: request.headers().to_vec(),
            body: request.body().cloned(),
        };
        let attempt_timeout = request.timeout_override().unwrap_or(self.timeout);

        match request.deadline_override().or(self.deadline) {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.run(&prepared, attempt_timeout, cancel)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(url = %prepared.url, ?deadline, "Request deadline exceeded");
                        Err(HttpClientError::DeadlineExceeded(deadline))
                    }
                }
            }
            None => self.run(&prepared, attempt_timeout, cancel).await,
        }
    }

    async fn run(
        &self,
        request: &TransportRequest,
        attempt_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let max_retries = self.retry_policy.max_retries;
        let mut attempt: u32 = 0;

        loop {
            self.rate_limiter.wait(cancel).await?;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HttpClientError::Cancelled),
                outcome = self.circuit_breaker.call(|| self.attempt(request, attempt_timeout)) => outcome,
            };

            let error = match outcome {
                Ok(response) => {
                    debug!(
                        method = %request.method,
                        url = %request.url,
                        status = response.status,
                        attempts = attempt + 1,
                        "Request succeeded"
                    );
                    return Ok(ApiResponse::new(response.status, response.body, attempt + 1));
                }
                Err(CircuitBreakerError::Open) => return Err(HttpClientError::CircuitOpen),
                Err(CircuitBreakerError::TooManyRequests) => {
                    return Err(HttpClientError::TooManyHalfOpenRequests);
                }
                Err(CircuitBreakerError::Inner(error)) => error,
            };

            let attempts = attempt + 1;
            let status = error.status_code();

            if !self.retry_policy.should_retry(status, error.is_transport()) {
                return Err(HttpClientError::NonRetryable {
                    attempts,
                    status,
                    source: Box::new(error),
                });
            }

            if attempt >= max_retries {
                warn!(url = %request.url, attempts, ?status, "Retries exhausted");
                return Err(HttpClientError::RetryExhausted {
                    attempts,
                    status,
                    source: Box::new(error),
                });
            }

            let backoff = self.retry_policy.calculate_backoff(attempt);
            debug!(
                url = %request.url,
                retry = attempts,
                max_retries,
                backoff_ms = backoff.as_millis() as u64,
                ?status,
                error = %error,
                "Retrying request"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(HttpClientError::Cancelled),
                _ = tokio::time::sleep(backoff) => {}
            }

            attempt += 1;
        }
    }

    /// One network round trip. Non-2xx responses become errors so the breaker
    /// counts them as failures.
    async fn attempt(&self, request: &TransportRequest, timeout: Duration) -> Result<TransportResponse> {
        let response = match tokio::time::timeout(timeout, self.transport.send(request.clone())).await {
            Ok(result) => result?,
            Err(_) => return Err(HttpClientError::Timeout(timeout)),
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(HttpClientError::from_response(response.status, &response.body))
        }
    }
}

/// Builder for [`RequestExecutor`].
pub struct RequestExecutorBuilder {
    transport: Arc<dyn Transport>,
    base_url: String,
    rate_limiter: Option<Arc<RateLimiter>>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    retry_policy: RetryPolicy,
    timeout: Duration,
    deadline: Option<Duration>,
}

impl RequestExecutorBuilder {
    /// Share an existing rate limiter.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Share an existing circuit breaker.
    pub fn circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(breaker);
        self
    }

    /// Set the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the default per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default overall deadline.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build the executor. Missing components get their defaults
    /// (100 tokens at 10 per second, default breaker).
    pub fn build(self) -> RequestExecutor {
        RequestExecutor {
            transport: self.transport,
            rate_limiter: self
                .rate_limiter
                .unwrap_or_else(|| Arc::new(RateLimiter::new(100.0, 10.0))),
            circuit_breaker: self.circuit_breaker.unwrap_or_default(),
            retry_policy: self.retry_policy,
            base_url: self.base_url,
            timeout: self.timeout,
            deadline: self.deadline,
        }
    }
}
