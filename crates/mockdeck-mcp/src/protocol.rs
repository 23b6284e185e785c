// ABOUTME: JSON-RPC protocol types for the tool bridge: envelopes, error codes, and MCP results
// ABOUTME: Validates raw envelopes and defines the initialize, tools/list, and tools/call wire shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// MCP protocol version supported by this server
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server version reported during MCP handshake
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol tag every envelope must carry
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// JSON-RPC Error Codes
// ============================================================================

/// JSON-RPC parse error: invalid JSON or wrong content type
pub const PARSE_ERROR: i32 = -32_700;

/// JSON-RPC invalid request: malformed envelope
pub const INVALID_REQUEST: i32 = -32_600;

/// JSON-RPC method not found
pub const METHOD_NOT_FOUND: i32 = -32_601;

/// JSON-RPC invalid parameters
pub const INVALID_PARAMS: i32 = -32_602;

/// JSON-RPC internal error, including outbound tool execution failures
pub const INTERNAL_ERROR: i32 = -32_603;

/// No tool server addressed by the request
pub const MISSING_SERVER_CONTEXT: i32 = -32_001;

/// Named tool does not exist on the server or is disabled
pub const TOOL_NOT_FOUND: i32 = -32_002;

/// Addressed tool server does not exist or is disabled
pub const SERVER_NOT_FOUND: i32 = -32_004;

// ============================================================================
// JSON-RPC Messages
// ============================================================================

/// A validated incoming envelope
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// Correlation id; `None` when the field is absent (notification)
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Validate a parsed JSON value as a JSON-RPC 2.0 request envelope
    ///
    /// The envelope must be an object with `jsonrpc == "2.0"`, a string
    /// `method`, and an `id` (when present) that is a string, number, or null.
    /// On rejection the returned response echoes the id when it was usable.
    pub fn from_value(value: Value) -> Result<Self, JsonRpcResponse> {
        let Value::Object(mut envelope) = value else {
            return Err(JsonRpcResponse::error(
                None,
                INVALID_REQUEST,
                "Invalid request: envelope must be a JSON object".to_owned(),
            ));
        };

        let id = envelope.remove("id");
        let id_usable = id
            .as_ref()
            .map_or(true, |v| v.is_string() || v.is_number() || v.is_null());
        if !id_usable {
            return Err(JsonRpcResponse::error(
                None,
                INVALID_REQUEST,
                "Invalid request: id must be a string, number, or null".to_owned(),
            ));
        }
        let echo_id = id.clone();

        match envelope.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            other => {
                return Err(JsonRpcResponse::error(
                    echo_id,
                    INVALID_REQUEST,
                    format!("Unsupported JSON-RPC version: {}", other.unwrap_or("<missing>")),
                ));
            }
        }

        let Some(Value::String(method)) = envelope.remove("method") else {
            return Err(JsonRpcResponse::error(
                echo_id,
                INVALID_REQUEST,
                "Invalid request: method must be a string".to_owned(),
            ));
        };

        Ok(Self {
            id,
            method,
            params: envelope.remove("params"),
        })
    }

    /// Whether this envelope is a one-way notification
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Outgoing JSON-RPC response
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Matching request identifier, `null` when it could not be determined
    pub id: Value,
    /// Success payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Build a success response with the given result
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response with the given code and message
    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
        }
    }

    /// Attach `data.message` to an error response
    pub fn with_data_message(mut self, detail: impl Into<String>) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.data = Some(json!({ "message": detail.into() }));
        }
        self
    }

    /// Error code, when this is an error response
    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}

// ============================================================================
// MCP Initialize
// ============================================================================

/// Parameters for the `initialize` request (logged, never required)
#[derive(Debug, Deserialize)]
pub struct InitializeParams {
    /// Protocol version requested by the client
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: Option<String>,
    /// Client identification
    #[serde(rename = "clientInfo", default)]
    pub client_info: Option<ClientInfo>,
}

/// Client identification sent during initialization
#[derive(Debug, Deserialize)]
pub struct ClientInfo {
    /// Client name
    pub name: String,
    /// Client version
    #[serde(default)]
    pub version: Option<String>,
}

/// Result of a successful `initialize` response
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    /// Protocol version the server supports
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities
    pub capabilities: ServerCapabilities,
    /// Server identification
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server identification
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// Tool server display name
    pub name: String,
    /// Server version
    pub version: String,
}

/// Server capability declarations
#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    /// Tool support
    pub tools: ToolsCapability,
}

/// Tool capability flags
#[derive(Debug, Serialize)]
pub struct ToolsCapability {
    /// The tool list is read per request; no change notifications are sent
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

// ============================================================================
// MCP Tools
// ============================================================================

/// Tool descriptor exposed via `tools/list`
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// Unique tool name within its server
    pub name: String,
    /// Human-readable tool description
    pub description: String,
    /// JSON Schema describing the tool's input
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Result of a `tools/list` call
#[derive(Debug, Serialize)]
pub struct ToolsListResult {
    /// Enabled tool descriptors
    pub tools: Vec<ToolDescriptor>,
}

/// Validated parameters of a `tools/call` request
#[derive(Debug, Clone, PartialEq)]
pub struct CallToolParams {
    /// Name of the tool to invoke
    pub name: String,
    /// Tool arguments
    pub arguments: Map<String, Value>,
}

impl CallToolParams {
    /// Validate raw `tools/call` params
    ///
    /// `name` must be a string; `arguments` must be an object, null, or absent.
    pub fn from_params(params: Option<Value>) -> Result<Self, String> {
        let Some(Value::Object(mut params)) = params else {
            return Err("Missing params for tools/call".to_owned());
        };

        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            Some(_) => return Err("Invalid params: name must be a string".to_owned()),
            None => return Err("Invalid params: missing tool name".to_owned()),
        };

        let arguments = match params.remove("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(arguments)) => arguments,
            Some(_) => return Err("Invalid params: arguments must be an object".to_owned()),
        };

        Ok(Self { name, arguments })
    }
}

/// Result of a `tools/call` invocation
#[derive(Debug, Serialize)]
pub struct CallToolResult {
    /// Response content parts
    pub content: Vec<ContentPart>,
    /// Whether the upstream call returned a non-2xx status
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// A content part within a tool result
#[derive(Debug, Serialize)]
pub struct ContentPart {
    /// Content type (always "text")
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content
    pub text: String,
}

impl ContentPart {
    /// Build a text content part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_owned(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_success_response() {
        let resp = JsonRpcResponse::success(Some(Value::from(1)), json!({"ok": true}));
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["id"], 1);
        assert!(json.get("result").is_some());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn unknown_id_serializes_as_null() {
        let resp = JsonRpcResponse::error(None, PARSE_ERROR, "bad json".to_owned());
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["id"], Value::Null);
        assert_eq!(json["error"]["code"], -32_700);
        assert!(json["error"].get("data").is_none());
    }

    #[test]
    fn data_message_is_attached() {
        let resp = JsonRpcResponse::error(Some(json!("a")), INTERNAL_ERROR, "failed".to_owned())
            .with_data_message("connection refused");
        let json = serde_json::to_value(&resp).expect("serialize");
        assert_eq!(json["error"]["data"]["message"], "connection refused");
    }

    #[test]
    fn valid_envelope_parses() {
        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": "abc", "method": "tools/list"
        }))
        .expect("valid");
        assert_eq!(req.method, "tools/list");
        assert_eq!(req.id, Some(json!("abc")));
        assert!(req.params.is_none());
        assert!(!req.is_notification());
    }

    #[test]
    fn missing_id_is_notification_but_null_id_is_not() {
        let note = JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "ping"}))
            .expect("valid");
        assert!(note.is_notification());

        let null_id =
            JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "ping"}))
                .expect("valid");
        assert!(!null_id.is_notification());
    }

    #[test]
    fn wrong_protocol_tag_is_rejected_with_id() {
        let err = JsonRpcRequest::from_value(json!({"jsonrpc": "1.0", "id": 9, "method": "ping"}))
            .expect_err("invalid");
        assert_eq!(err.error_code(), Some(INVALID_REQUEST));
        assert_eq!(err.id, json!(9));
    }

    #[test]
    fn non_string_method_and_bad_shapes_are_rejected() {
        for raw in [
            json!({"jsonrpc": "2.0", "id": 1, "method": 5}),
            json!({"jsonrpc": "2.0", "id": 1}),
            json!({"jsonrpc": "2.0", "id": {"x": 1}, "method": "ping"}),
            json!([{"jsonrpc": "2.0", "id": 1, "method": "ping"}]),
            json!("ping"),
        ] {
            let err = JsonRpcRequest::from_value(raw).expect_err("invalid");
            assert_eq!(err.error_code(), Some(INVALID_REQUEST));
        }
    }

    #[test]
    fn call_params_validation() {
        let ok = CallToolParams::from_params(Some(json!({"name": "getUser", "arguments": {"id": "7"}})))
            .expect("valid");
        assert_eq!(ok.name, "getUser");
        assert_eq!(ok.arguments["id"], "7");

        let no_args = CallToolParams::from_params(Some(json!({"name": "ping"}))).expect("valid");
        assert!(no_args.arguments.is_empty());

        assert!(CallToolParams::from_params(None).is_err());
        assert!(CallToolParams::from_params(Some(json!({"name": 3}))).is_err());
        assert!(CallToolParams::from_params(Some(json!({"arguments": {}}))).is_err());
        assert!(
            CallToolParams::from_params(Some(json!({"name": "x", "arguments": [1]}))).is_err()
        );
    }

    #[test]
    fn initialize_result_shape() {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "Users API".to_owned(),
                version: SERVER_VERSION.to_owned(),
            },
        };
        let json = serde_json::to_value(result).expect("serialize");
        assert_eq!(json["protocolVersion"], "2024-11-05");
        assert_eq!(json["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(json["serverInfo"]["name"], "Users API");
    }
}
