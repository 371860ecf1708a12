//! Severity tools (served through the response cache).

use super::{Arguments, Tool, ToolError, format_json_response, format_pretty, require_string_arg};
use async_trait::async_trait;
use incidentio_api::IncidentIoClient;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

pub struct ListSeveritiesTool {
    client: IncidentIoClient,
    max_response_size: usize,
}

impl ListSeveritiesTool {
    pub fn new(client: IncidentIoClient, max_response_size: usize) -> Self {
        Self {
            client,
            max_response_size,
        }
    }
}

#[async_trait]
impl Tool for ListSeveritiesTool {
    fn name(&self) -> &'static str {
        "list_severities"
    }

    fn description(&self) -> &'static str {
        "List all severity levels configured in incident.io, ordered by rank. \
         Use the returned IDs for severity_id and the severity filters of list_incidents."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        _args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let list = self.client.list_severities(cancel).await?;
        let response = json!({
            "severities": list.severities,
            "count": list.severities.len(),
        });
        format_json_response(&response, self.max_response_size)
    }
}

pub struct GetSeverityTool {
    client: IncidentIoClient,
}

impl GetSeverityTool {
    pub fn new(client: IncidentIoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetSeverityTool {
    fn name(&self) -> &'static str {
        "get_severity"
    }

    fn description(&self) -> &'static str {
        "Get details of a specific severity level by ID"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "severity_id": {"type": "string", "description": "The severity ID"}
            },
            "required": ["severity_id"],
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        let id = require_string_arg(args, "severity_id")?;
        let severity = self.client.get_severity(&id, cancel).await?;
        format_pretty(&severity)
    }
}
