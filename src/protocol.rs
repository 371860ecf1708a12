//! JSON-RPC 2.0 message types for the Model Context Protocol.
//!
//! A single [`Message`] shape carries requests, notifications and responses,
//! mirroring the wire format: which fields are present decides what it is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Protocol revision announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "incidentio-mcp-server";

pub const JSONRPC_VERSION: &str = "2.0";

// JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// A JSON-RPC message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// `None` (absent or `null`) on a request marks a notification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Message {
    /// Build a request (or, with `id: None`, a notification).
    pub fn request(id: Option<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Build a successful response.
    pub fn response(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id: Some(id),
            method: None,
            params: None,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response. An unknown id is serialized as `null`.
    pub fn error_response(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_version(),
            id: Some(id.unwrap_or(Value::Null)),
            method: None,
            params: None,
            result: None,
            error: Some(ErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Requests without an id expect no response.
    pub fn is_notification(&self) -> bool {
        self.id.as_ref().is_none_or(Value::is_null)
    }
}

/// Parameters of a `tools/call` request.
#[derive(Debug, Clone, PartialEq)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl CallToolParams {
    /// Extract the tool name and arguments.
    ///
    /// Arguments that are missing or not an object are treated as empty.
    pub fn from_params(params: Option<&Value>) -> Result<Self, &'static str> {
        let params = params.and_then(Value::as_object).ok_or("invalid params")?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or("missing tool name")?;
        let arguments = params
            .get("arguments")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            arguments,
        })
    }
}

/// `result` of `initialize`.
pub fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// `result` of a successful `tools/call`.
pub fn tool_result(text: String) -> Value {
    json!({
        "content": [
            {"type": "text", "text": text}
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_round_trip_fields() {
        let msg: Message =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
        assert_eq!(msg.id, Some(json!(1)));
        assert_eq!(msg.method.as_deref(), Some("tools/list"));
        assert!(!msg.is_notification());
    }

    #[test]
    fn test_missing_or_null_id_is_notification() {
        let msg: Message =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(msg.is_notification());

        let msg: Message =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(msg.is_notification());
    }

    #[test]
    fn test_error_response_serializes_null_id() {
        let msg = Message::error_response(None, PARSE_ERROR, "invalid JSON");
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], -32700);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_response_omits_request_fields() {
        let value = serde_json::to_value(Message::response(json!("abc"), json!({}))).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": "abc", "result": {}}));
    }

    #[test]
    fn test_call_tool_params() {
        let params = json!({"name": "get_incident", "arguments": {"incident_id": "42"}});
        let call = CallToolParams::from_params(Some(&params)).unwrap();
        assert_eq!(call.name, "get_incident");
        assert_eq!(call.arguments["incident_id"], "42");

        let params = json!({"name": "list_severities", "arguments": null});
        let call = CallToolParams::from_params(Some(&params)).unwrap();
        assert!(call.arguments.is_empty());

        assert_eq!(CallToolParams::from_params(None), Err("invalid params"));
        assert_eq!(
            CallToolParams::from_params(Some(&json!({"arguments": {}}))),
            Err("missing tool name")
        );
    }

    #[test]
    fn test_initialize_result_shape() {
        let result = initialize_result();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert!(result["capabilities"]["tools"].is_object());
    }
}
