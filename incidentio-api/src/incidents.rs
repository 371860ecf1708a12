//! Incident endpoints (v2).

use crate::client::{require_id, resource_path};
use crate::types::IncidentEnvelope;
use crate::{
    ApiError, CreateIncidentRequest, Incident, IncidentIoClient, ListIncidentsOptions,
    ListIncidentsResponse, Result, UpdateIncidentRequest,
};
use incidentio_http_client::ApiRequest;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Serialize)]
struct EditIncidentBody<'a> {
    incident: &'a UpdateIncidentRequest,
}

impl IncidentIoClient {
    /// `GET /incidents` with filters.
    pub async fn list_incidents(
        &self,
        options: &ListIncidentsOptions,
        cancel: &CancellationToken,
    ) -> Result<ListIncidentsResponse> {
        let request = ApiRequest::get("/incidents").queries(options.to_query());
        self.fetch("list incidents", request, cancel).await
    }

    /// `GET /incidents/{id}`. Accepts a full ID or a numeric reference.
    pub async fn get_incident(&self, id: &str, cancel: &CancellationToken) -> Result<Incident> {
        let id = require_id("incident_id", id)?;
        let envelope: IncidentEnvelope = self
            .fetch("get incident", ApiRequest::get(resource_path("incidents", id)), cancel)
            .await?;
        Ok(envelope.incident)
    }

    /// `POST /incidents`.
    pub async fn create_incident(
        &self,
        request: &CreateIncidentRequest,
        cancel: &CancellationToken,
    ) -> Result<Incident> {
        if request.name.trim().is_empty() {
            return Err(ApiError::InvalidArgument("name must not be empty".to_string()));
        }

        let api_request = ApiRequest::post("/incidents").json(request)?;
        let envelope: IncidentEnvelope = self.fetch("create incident", api_request, cancel).await?;
        Ok(envelope.incident)
    }

    /// `PATCH /incidents/{id}` with body `{"incident": {...}}`.
    pub async fn update_incident(
        &self,
        id: &str,
        update: &UpdateIncidentRequest,
        cancel: &CancellationToken,
    ) -> Result<Incident> {
        let id = require_id("incident_id", id)?;
        if update.is_empty() {
            return Err(ApiError::InvalidArgument(
                "at least one field to update must be provided".to_string(),
            ));
        }

        let api_request = ApiRequest::patch(resource_path("incidents", id))
            .json(&EditIncidentBody { incident: update })?;
        let envelope: IncidentEnvelope = self.fetch("update incident", api_request, cancel).await?;
        Ok(envelope.incident)
    }
}
