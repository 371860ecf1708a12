//! MCP tools backed by the incident.io API.
//!
//! Each tool declares a name, a description and a JSON schema for its
//! arguments, and turns a `tools/call` into one or more API calls. All tools
//! share one [`IncidentIoClient`], so every invocation goes through the same
//! cache, rate limiter and circuit breaker.

mod health;
mod helpers;
mod incidents;
mod severities;
mod workflows;

pub use health::GetClientHealthTool;
pub use helpers::{
    bool_arg, format_json_response, format_pretty, int_arg, require_string_arg, string_arg,
    string_array_arg,
};
pub use incidents::{CreateIncidentTool, GetIncidentTool, ListIncidentsTool, UpdateIncidentTool};
pub use severities::{GetSeverityTool, ListSeveritiesTool};
pub use workflows::{GetWorkflowTool, ListWorkflowsTool, UpdateWorkflowTool};

use async_trait::async_trait;
use incidentio_api::{ApiError, IncidentIoClient};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Arguments of a tool call, as sent by the client.
pub type Arguments = Map<String, Value>;

/// Errors reported back to the caller of a tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// An argument was missing or malformed.
    #[error("{0}")]
    InvalidArgument(String),

    /// The API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The result could not be rendered.
    #[error("failed to format response: {0}")]
    Format(#[from] serde_json::Error),

    /// A failure with extra guidance appended.
    #[error("{0}")]
    Message(String),
}

/// A callable MCP tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &'static str;

    /// Human readable description shown to the model.
    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn input_schema(&self) -> Value;

    /// Run the tool and return its text result.
    async fn execute(
        &self,
        args: &Arguments,
        cancel: &CancellationToken,
    ) -> Result<String, ToolError>;
}

/// Tools by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every incident.io tool, sharing `client`.
    ///
    /// `max_response_size` bounds the size of list results.
    pub fn incident_io(client: IncidentIoClient, max_response_size: usize) -> Self {
        let mut registry = Self::new();
        registry.register(ListIncidentsTool::new(client.clone(), max_response_size));
        registry.register(GetIncidentTool::new(client.clone()));
        registry.register(CreateIncidentTool::new(client.clone()));
        registry.register(UpdateIncidentTool::new(client.clone()));
        registry.register(ListSeveritiesTool::new(client.clone(), max_response_size));
        registry.register(GetSeverityTool::new(client.clone()));
        registry.register(ListWorkflowsTool::new(client.clone(), max_response_size));
        registry.register(GetWorkflowTool::new(client.clone()));
        registry.register(UpdateWorkflowTool::new(client.clone()));
        registry.register(GetClientHealthTool::new(client));
        registry
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// `tools/list` entries, sorted by name.
    pub fn descriptors(&self) -> Vec<Value> {
        self.tools
            .values()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the message argument"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "properties": {"message": {"type": "string"}}})
        }

        async fn execute(
            &self,
            args: &Arguments,
            _cancel: &CancellationToken,
        ) -> Result<String, ToolError> {
            require_string_arg(args, "message")
        }
    }

    #[tokio::test]
    async fn test_register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);

        assert_eq!(registry.len(), 1);
        let tool = registry.get("echo").unwrap();

        let mut args = Arguments::new();
        args.insert("message".into(), json!("hi"));
        let out = tool.execute(&args, &CancellationToken::new()).await.unwrap();
        assert_eq!(out, "hi");

        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_descriptors_use_camel_case_schema_key() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);

        let descriptors = registry.descriptors();
        assert_eq!(descriptors[0]["name"], "echo");
        assert!(descriptors[0]["inputSchema"].is_object());
    }
}
