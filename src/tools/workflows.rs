//! Workflow tools: list, get, update.

use super::{
    Arguments, Tool, ToolError, bool_arg, format_json_response, format_pretty, int_arg,
    require_string_arg, string_arg,
};
use async_trait::async_trait;
use incidentio_api::{IncidentIoClient, ListWorkflowsParams, UpdateWorkflowRequest};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub struct ListWorkflowsTool {
    client: IncidentIoClient,
    max_response_size: usize,
}

impl ListWorkflowsTool {
    pub fn new(client: IncidentIoClient, max_response_size: usize) -> Self {
        Self {
            client,
            max_response_size,
        }
    }
}

#[async_trait]
impl Tool for ListWorkflowsTool {
    fn name(&self) -> &'static str {
        "list_workflows"
    }

    fn description(&self) -> &'static str {
        "List incident.io workflows with their trigger, enabled flag and state"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "page_size": {
                    "type": "integer",
                    "description": "Number of results per page",
                    "minimum": 1,
                    "maximum": 250
                },
                "after": {
                    "type": "string",
                    "description": "Pagination cursor from a previous response"
                }
            },
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let page_size = int_arg(args, "page_size", 0);
        let params = ListWorkflowsParams {
            page_size: (page_size > 0).then(|| page_size.min(250) as u32),
            after: string_arg(args, "after"),
        };

        let list = self.client.list_workflows(Some(&params), cancel).await?;
        let response = json!({
            "workflows": list.workflows,
            "pagination_meta": list.pagination_meta,
            "count": list.workflows.len(),
        });
        format_json_response(&response, self.max_response_size)
    }
}

pub struct GetWorkflowTool {
    client: IncidentIoClient,
}

impl GetWorkflowTool {
    pub fn new(client: IncidentIoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetWorkflowTool {
    fn name(&self) -> &'static str {
        "get_workflow"
    }

    fn description(&self) -> &'static str {
        "Get details of a specific workflow by ID"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": {"type": "string", "description": "The workflow ID"}
            },
            "required": ["workflow_id"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let id = require_string_arg(args, "workflow_id")?;
        let workflow = self.client.get_workflow(&id, cancel).await?;
        format_pretty(&workflow)
    }
}

pub struct UpdateWorkflowTool {
    client: IncidentIoClient,
}

impl UpdateWorkflowTool {
    pub fn new(client: IncidentIoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for UpdateWorkflowTool {
    fn name(&self) -> &'static str {
        "update_workflow"
    }

    fn description(&self) -> &'static str {
        "Update a workflow's name, enabled flag or state"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "workflow_id": {"type": "string", "description": "The workflow ID to update"},
                "name": {"type": "string", "description": "New workflow name"},
                "enabled": {"type": "boolean", "description": "Enable or disable the workflow"},
                "state": {
                    "type": "string",
                    "description": "Workflow state (e.g. active, disabled, draft)"
                }
            },
            "required": ["workflow_id"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let id = require_string_arg(args, "workflow_id")?;
        let update = UpdateWorkflowRequest {
            name: string_arg(args, "name"),
            enabled: bool_arg(args, "enabled"),
            state: string_arg(args, "state"),
        };
        if update.is_empty() {
            return Err(ToolError::InvalidArgument(
                "at least one field to update must be provided".to_string(),
            ));
        }

        let workflow = self.client.update_workflow(&id, &update, cancel).await?;
        format_pretty(&workflow)
    }
}
