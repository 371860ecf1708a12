//! The incident.io client and its shared request helpers.

use crate::{ApiError, Result};
use bytes::Bytes;
use incidentio_cache::TtlCache;
use incidentio_http_client::{ApiRequest, RequestExecutor};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default root of the v1 API (severities live there).
pub const DEFAULT_V1_BASE_URL: &str = "https://api.incident.io/v1";

/// Typed access to the incident.io API.
///
/// Cheap to clone; clones share the executor (and with it the rate limiter
/// and circuit breaker) and the response cache.
#[derive(Debug, Clone)]
pub struct IncidentIoClient {
    executor: Arc<RequestExecutor>,
    cache: Arc<TtlCache<Bytes>>,
    v1_base_url: String,
}

impl IncidentIoClient {
    /// Create a client. `v1_base_url` is used for endpoints that only exist
    /// on the v1 API.
    pub fn new(
        executor: Arc<RequestExecutor>,
        cache: Arc<TtlCache<Bytes>>,
        v1_base_url: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            cache,
            v1_base_url: v1_base_url.into(),
        }
    }

    /// Get the request executor.
    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    /// Get the response cache.
    pub fn cache(&self) -> &Arc<TtlCache<Bytes>> {
        &self.cache
    }

    pub(crate) fn v1_base_url(&self) -> &str {
        &self.v1_base_url
    }

    /// Execute and decode.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let response = self.executor.execute(request, cancel).await?;
        decode(endpoint, response.bytes())
    }

    /// Serve from the cache when fresh, otherwise execute, decode and cache
    /// the raw body. Only bodies that decode are cached.
    pub(crate) async fn fetch_cached<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        key: String,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T> {
        if let Some(body) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit");
            return decode(endpoint, &body);
        }

        let response = self.executor.execute(request, cancel).await?;
        let value = decode(endpoint, response.bytes())?;
        self.cache.set(key, response.into_bytes());

        Ok(value)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &'static str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|source| ApiError::Decode { endpoint, source })
}

/// Reject empty IDs before they turn into `/incidents/` requests.
///
/// `.` and `..` are rejected too: URL parsing treats them (even as
/// `%2E%2E`) as dot segments and would rewrite the endpoint.
pub(crate) fn require_id<'a>(field: &str, id: &'a str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::InvalidArgument(format!("{} must not be empty", field)));
    }
    if id == "." || id == ".." {
        return Err(ApiError::InvalidArgument(format!("{} is not a valid ID: {}", field, id)));
    }
    Ok(id)
}

/// Everything outside RFC 3986 `unreserved` is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `/{collection}/{id}` with the ID escaped as a single path segment.
pub(crate) fn resource_path(collection: &str, id: &str) -> String {
    format!("/{}/{}", collection, utf8_percent_encode(id, PATH_SEGMENT))
}
