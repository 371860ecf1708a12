//! Workflow endpoints (v2).

use crate::client::{require_id, resource_path};
use crate::types::WorkflowEnvelope;
use crate::{
    ApiError, IncidentIoClient, ListWorkflowsParams, ListWorkflowsResponse, Result,
    UpdateWorkflowRequest, Workflow,
};
use incidentio_http_client::ApiRequest;
use tokio_util::sync::CancellationToken;

impl IncidentIoClient {
    /// `GET /workflows`.
    pub async fn list_workflows(
        &self,
        params: Option<&ListWorkflowsParams>,
        cancel: &CancellationToken,
    ) -> Result<ListWorkflowsResponse> {
        let mut request = ApiRequest::get("/workflows");
        if let Some(params) = params {
            request = request.queries(params.to_query());
        }
        self.fetch("list workflows", request, cancel).await
    }

    /// `GET /workflows/{id}`.
    pub async fn get_workflow(&self, id: &str, cancel: &CancellationToken) -> Result<Workflow> {
        let id = require_id("workflow_id", id)?;
        let envelope: WorkflowEnvelope = self
            .fetch("get workflow", ApiRequest::get(resource_path("workflows", id)), cancel)
            .await?;
        Ok(envelope.workflow)
    }

    /// `PATCH /workflows/{id}`.
    pub async fn update_workflow(
        &self,
        id: &str,
        update: &UpdateWorkflowRequest,
        cancel: &CancellationToken,
    ) -> Result<Workflow> {
        let id = require_id("workflow_id", id)?;
        if update.is_empty() {
            return Err(ApiError::InvalidArgument(
                "at least one field to update must be provided".to_string(),
            ));
        }

        let request = ApiRequest::patch(resource_path("workflows", id)).json(update)?;
        let envelope: WorkflowEnvelope = self.fetch("update workflow", request, cancel).await?;
        Ok(envelope.workflow)
    }
}
