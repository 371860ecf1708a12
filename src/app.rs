//! Wiring: turn an [`McpConfig`] into a running server.

use crate::Result;
use crate::server::McpServer;
use crate::tools::ToolRegistry;
use crate::transport;
use bytes::Bytes;
use incidentio_api::IncidentIoClient;
use incidentio_cache::TtlCache;
use incidentio_config::{CircuitBreakerSettings, McpConfig, RetrySettings, TransportKind};
use incidentio_http_client::{
    CircuitBreaker, CircuitBreakerConfig, HttpClientConfig, RateLimiter, ReqwestTransport,
    RequestExecutor, RetryPolicy, Transport,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Retry policy for the configured knobs.
pub fn retry_policy(settings: &RetrySettings) -> RetryPolicy {
    RetryPolicy::exponential(settings.max_retries, settings.initial_backoff())
        .with_max_backoff(settings.max_backoff())
        .with_multiplier(settings.multiplier)
        .with_status_codes(settings.retryable_status_codes.iter().copied())
        .with_jitter(settings.jitter)
}

/// Circuit breaker configuration for the configured knobs.
pub fn circuit_breaker_config(settings: &CircuitBreakerSettings) -> CircuitBreakerConfig {
    CircuitBreakerConfig::new(settings.max_failures, settings.timeout())
        .with_failure_threshold(settings.failure_threshold)
        .with_min_requests(settings.min_requests)
        .with_half_open_requests(settings.half_open_max_requests)
}

/// Build the API client over the production transport.
///
/// `config` is expected to have been validated.
pub fn build_client(config: &McpConfig) -> Result<IncidentIoClient> {
    let http = HttpClientConfig::builder()
        .api_key(config.api.api_key.clone())
        .timeout(config.api.timeout())
        .build();
    let transport = Arc::new(ReqwestTransport::new(&http)?);
    Ok(build_client_with_transport(config, transport))
}

/// Build the API client over any transport.
pub fn build_client_with_transport(
    config: &McpConfig,
    transport: Arc<dyn Transport>,
) -> IncidentIoClient {
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit.max_tokens,
        config.rate_limit.refill_rate,
    ));
    let circuit_breaker = Arc::new(CircuitBreaker::new(circuit_breaker_config(
        &config.circuit_breaker,
    )));

    let executor = RequestExecutor::builder(transport, config.api.base_url.clone())
        .rate_limiter(rate_limiter)
        .circuit_breaker(circuit_breaker)
        .retry_policy(retry_policy(&config.retry))
        .timeout(config.api.timeout())
        .build();

    let cache = Arc::new(TtlCache::<Bytes>::new(config.cache.ttl()));
    IncidentIoClient::new(Arc::new(executor), cache, config.api.v1_base_url.clone())
}

/// The dispatcher with every incident.io tool registered.
pub fn build_server(client: IncidentIoClient, config: &McpConfig) -> Arc<McpServer> {
    let tools = ToolRegistry::incident_io(client, config.server.max_response_size);
    debug!(tools = ?tools.names(), "Registered tools");
    Arc::new(McpServer::new(tools))
}

/// Periodically drop expired cache entries until `cancel` fires.
pub fn spawn_cache_sweeper(
    cache: Arc<TtlCache<Bytes>>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let period = cache.ttl().max(std::time::Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = cache.clean_expired();
                    if removed > 0 {
                        debug!(removed, "Swept expired cache entries");
                    }
                }
            }
        }
    })
}

/// Run the configured transport until it finishes or `cancel` fires.
pub async fn run(config: McpConfig, cancel: CancellationToken) -> Result<()> {
    let client = build_client(&config)?;
    let sweeper = spawn_cache_sweeper(client.cache().clone(), cancel.clone());
    let server = build_server(client, &config);

    info!(
        transport = %config.server.transport,
        base_url = %config.api.base_url,
        tools = server.tools().len(),
        "Starting incident.io MCP server"
    );

    let result = match config.server.transport {
        TransportKind::Stdio => transport::serve_stdio(server, cancel.clone()).await,
        TransportKind::Http => {
            let host = config.server.host.parse::<IpAddr>().unwrap_or_else(|e| {
                warn!(host = %config.server.host, error = %e, "Invalid host, listening on all interfaces");
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            });
            let addr = SocketAddr::new(host, config.server.port);
            transport::serve_http(server, addr, cancel.clone()).await
        }
    };

    cancel.cancel();
    let _ = sweeper.await;
    info!("Server stopped");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_retry_policy_from_settings() {
        let settings = RetrySettings {
            max_retries: 5,
            initial_backoff_ms: 50,
            max_backoff_ms: 1_000,
            multiplier: 3.0,
            retryable_status_codes: vec![503],
            jitter: 0.0,
        };
        let policy = retry_policy(&settings);

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(50));
        assert_eq!(policy.max_backoff, Duration::from_secs(1));
        assert!(policy.should_retry(Some(503), false));
        assert!(!policy.should_retry(Some(500), false));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(150));
    }

    #[test]
    fn test_circuit_breaker_config_from_settings() {
        let settings = CircuitBreakerSettings {
            max_failures: 2,
            failure_threshold: 0.25,
            min_requests: 4,
            timeout_secs: 5,
            half_open_max_requests: 1,
        };
        let config = circuit_breaker_config(&settings);

        assert_eq!(config.max_failures, 2);
        assert_eq!(config.failure_threshold, 0.25);
        assert_eq!(config.min_requests, 4);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.half_open_max_requests, 1);
    }

    #[tokio::test]
    async fn test_build_server_registers_all_tools() {
        let mut config = McpConfig::default();
        config.api.api_key = "test".into();

        let client = build_client(&config).unwrap();
        let server = build_server(client, &config);

        assert_eq!(
            server.tools().names(),
            vec![
                "create_incident",
                "get_client_health",
                "get_incident",
                "get_severity",
                "get_workflow",
                "list_incidents",
                "list_severities",
                "list_workflows",
                "update_incident",
                "update_workflow",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_sweeper_stops_on_cancel() {
        let cache = Arc::new(TtlCache::<Bytes>::new(Duration::from_secs(5)));
        cache.set("k", Bytes::from_static(b"v"));
        let cancel = CancellationToken::new();
        let handle = spawn_cache_sweeper(cache.clone(), cancel.clone());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(cache.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
