//! MCP request dispatch, independent of the transport.

use crate::protocol::{
    CallToolParams, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, Message,
    PARSE_ERROR, initialize_result, tool_result,
};
use crate::tools::ToolRegistry;
use serde_json::{Value, json};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Handles decoded JSON-RPC messages against a tool registry.
///
/// Shared by every connection and safe to call concurrently.
#[derive(Debug)]
pub struct McpServer {
    tools: ToolRegistry,
}

impl McpServer {
    pub fn new(tools: ToolRegistry) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Decode and handle one raw message.
    ///
    /// Undecodable input yields a parse error response with a `null` id.
    pub async fn handle_raw(&self, raw: &[u8], cancel: &CancellationToken) -> Option<Message> {
        match serde_json::from_slice::<Message>(raw) {
            Ok(message) => self.handle_message(message, cancel).await,
            Err(e) => {
                warn!(error = %e, "Received invalid JSON");
                Some(Message::error_response(
                    None,
                    PARSE_ERROR,
                    format!("invalid JSON: {}", e),
                ))
            }
        }
    }

    /// Handle one message. Notifications produce no response.
    pub async fn handle_message(
        &self,
        message: Message,
        cancel: &CancellationToken,
    ) -> Option<Message> {
        if message.is_notification() {
            debug!(method = ?message.method, "Notification received");
            return None;
        }
        let id = message.id.clone().unwrap_or(Value::Null);

        let Some(method) = message.method.as_deref() else {
            return Some(Message::error_response(
                Some(id),
                INVALID_REQUEST,
                "invalid request: missing method",
            ));
        };

        let response = match method {
            "initialize" => Message::response(id, initialize_result()),
            "ping" => Message::response(id, json!({})),
            "tools/list" => Message::response(id, json!({"tools": self.tools.descriptors()})),
            "tools/call" => self.call_tool(id, message.params.as_ref(), cancel).await,
            other => Message::error_response(
                Some(id),
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    async fn call_tool(
        &self,
        id: Value,
        params: Option<&Value>,
        cancel: &CancellationToken,
    ) -> Message {
        let call = match CallToolParams::from_params(params) {
            Ok(call) => call,
            Err(reason) => return Message::error_response(Some(id), INVALID_PARAMS, reason),
        };

        let Some(tool) = self.tools.get(&call.name) else {
            return Message::error_response(
                Some(id),
                INVALID_PARAMS,
                format!("tool not found: {}", call.name),
            );
        };

        let started = Instant::now();
        match tool.execute(&call.arguments, cancel).await {
            Ok(text) => {
                info!(
                    tool = %call.name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    bytes = text.len(),
                    "Tool call succeeded"
                );
                Message::response(id, tool_result(text))
            }
            Err(e) => {
                warn!(
                    tool = %call.name,
                    duration_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Tool call failed"
                );
                Message::error_response(Some(id), INTERNAL_ERROR, e.to_string())
            }
        }
    }
}
