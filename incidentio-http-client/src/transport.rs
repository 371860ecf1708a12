//! The network seam: one HTTP exchange, no policy.

use crate::{HttpClientConfig, HttpClientError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use tracing::debug;
use url::Url;

/// A fully resolved request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

/// Raw response: any status, whole body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single HTTP exchange.
///
/// Implementations return `Ok` for every response that arrived, whatever its
/// status; `Err` means no response was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with bearer auth, JSON content type and pooling
    /// settings from `config`.
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let bearer = HeaderValue::try_from(format!("Bearer {}", config.api_key))
            .map_err(|e| HttpClientError::RequestBuild(format!("invalid API key: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &config.default_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
            headers.insert(name, value);
        }

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()?;

        Ok(Self { inner })
    }

    /// Wrap an existing reqwest client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self.inner.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_send_error)?;

        Ok(TransportResponse { status, body })
    }
}

fn map_send_error(error: reqwest::Error) -> HttpClientError {
    if error.is_connect() || error.is_timeout() || error.is_request() || error.is_body() {
        HttpClientError::Transport(error.to_string())
    } else {
        HttpClientError::Http(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> ReqwestTransport {
        let config = HttpClientConfig::builder()
            .api_key("test-key")
            .user_agent("incidentio-mcp/test")
            .build();
        ReqwestTransport::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_sends_auth_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/incidents"))
            .and(header("authorization", "Bearer test-key"))
            .and(header("content-type", "application/json"))
            .and(header("user-agent", "incidentio-mcp/test"))
            .and(body_json(serde_json::json!({"name": "Outage"})))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let request = TransportRequest {
            method: Method::POST,
            url: Url::parse(&format!("{}/v2/incidents", server.uri())).unwrap(),
            headers: Vec::new(),
            body: Some(Bytes::from_static(br#"{"name":"Outage"}"#)),
        };

        let response = transport().send(request).await.unwrap();
        assert_eq!(response.status, 201);
        assert!(response.is_success());
        assert_eq!(response.body.as_ref(), br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_error_status_is_ok_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let request = TransportRequest {
            method: Method::GET,
            url: Url::parse(&server.uri()).unwrap(),
            headers: Vec::new(),
            body: None,
        };

        let response = transport().send(request).await.unwrap();
        assert_eq!(response.status, 503);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let request = TransportRequest {
            method: Method::GET,
            url: Url::parse("http://127.0.0.1:1/unreachable").unwrap(),
            headers: Vec::new(),
            body: None,
        };

        let error = transport().send(request).await.unwrap_err();
        assert!(error.is_transport(), "{:?}", error);
    }
}
