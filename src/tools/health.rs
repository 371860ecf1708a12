//! Client health tool.

use super::{Arguments, Tool, ToolError, format_pretty};
use async_trait::async_trait;
use incidentio_api::IncidentIoClient;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// Reports circuit breaker, rate limiter and cache state without calling the API.
pub struct GetClientHealthTool {
    client: IncidentIoClient,
}

impl GetClientHealthTool {
    pub fn new(client: IncidentIoClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetClientHealthTool {
    fn name(&self) -> &'static str {
        "get_client_health"
    }

    fn description(&self) -> &'static str {
        "Report the health of the incident.io client: circuit breaker state and counts, \
         rate limiter tokens and throttling, and cached entries. Use this when calls fail \
         with 'circuit breaker is open' to see when the API will be retried."
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
        _cancel: &CancellationToken,
    ) -> Result<String, ToolError> {
        format_pretty(&self.client.health())
    }
}
