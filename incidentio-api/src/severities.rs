//! Severity endpoints (v1 only). Severities change rarely, so both calls are
//! read through the response cache.

use crate::client::{require_id, resource_path};
use crate::types::SeverityEnvelope;
use crate::{IncidentIoClient, ListSeveritiesResponse, Result, Severity};
use incidentio_http_client::ApiRequest;
use tokio_util::sync::CancellationToken;

/// Cache key for the severity list.
pub const SEVERITIES_CACHE_KEY: &str = "severities:list";

/// Cache key for a single severity.
pub fn severity_cache_key(id: &str) -> String {
    format!("severity:{}", id)
}

impl IncidentIoClient {
    /// `GET /v1/severities`, cached.
    pub async fn list_severities(&self, cancel: &CancellationToken) -> Result<ListSeveritiesResponse> {
        let request = ApiRequest::get("/severities").base_url(self.v1_base_url());
        self.fetch_cached("list severities", SEVERITIES_CACHE_KEY.to_string(), request, cancel)
            .await
    }

    /// `GET /v1/severities/{id}`, cached.
    pub async fn get_severity(&self, id: &str, cancel: &CancellationToken) -> Result<Severity> {
        let id = require_id("severity_id", id)?;
        let request = ApiRequest::get(resource_path("severities", id)).base_url(self.v1_base_url());

        let envelope: SeverityEnvelope = self
            .fetch_cached("get severity", severity_cache_key(id), request, cancel)
            .await?;
        Ok(envelope.severity)
    }
}
