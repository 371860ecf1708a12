//! # incident.io HTTP client
//!
//! The outbound half of the resilience pipeline: every call to the
//! incident.io API goes through a [`RequestExecutor`], which combines
//!
//! - **Rate limiting**: a shared token bucket ([`incidentio_ratelimit::RateLimiter`])
//! - **Circuit breaker**: fails fast while the API is unhealthy
//! - **Retry with backoff**: exponential delays for transient failures
//! - **Timeouts**: per attempt, plus an optional overall deadline
//!
//! The network itself sits behind the [`Transport`] trait; [`ReqwestTransport`]
//! is the production implementation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use incidentio_http_client::{
//!     ApiRequest, HttpClientConfig, ReqwestTransport, RequestExecutor, RetryPolicy,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::builder().api_key("secret").build();
//!     let transport = Arc::new(ReqwestTransport::new(&config)?);
//!
//!     let executor = RequestExecutor::builder(transport, "https://api.incident.io/v2")
//!         .retry_policy(RetryPolicy::default())
//!         .build();
//!
//!     let response = executor
//!         .execute(ApiRequest::get("/incidents"), &CancellationToken::new())
//!         .await?;
//!
//!     println!("Status: {} after {} attempts", response.status(), response.attempts());
//!     Ok(())
//! }
//! ```

mod circuit_breaker;
mod config;
mod error;
mod executor;
mod request;
mod response;
mod retry;
mod transport;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitState,
};
pub use config::{DEFAULT_BASE_URL, HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use executor::{RequestExecutor, RequestExecutorBuilder};
pub use request::ApiRequest;
pub use response::ApiResponse;
pub use retry::{DEFAULT_RETRYABLE_STATUS_CODES, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};

pub use incidentio_ratelimit::{RateLimitError, RateLimiter, RateLimiterStats};
