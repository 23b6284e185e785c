// ABOUTME: Protocol dispatcher routing validated JSON-RPC envelopes to tool-server-scoped handlers
// ABOUTME: Implements initialize, tools/list, tools/call, and ping with notification short-circuiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use mockdeck::types::{EngineError, ErrorKind, ToolServer};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ServerCapabilities, ServerInfo, ToolsCapability, ToolsListResult, INTERNAL_ERROR,
    INVALID_PARAMS, METHOD_NOT_FOUND, MISSING_SERVER_CONTEXT, PARSE_ERROR, PROTOCOL_VERSION,
    SERVER_NOT_FOUND, SERVER_VERSION, TOOL_NOT_FOUND,
};
use crate::state::SharedState;
use crate::tools;

/// Outcome of dispatching one message
#[derive(Debug)]
pub enum Reply {
    /// A response envelope to send back
    Response(JsonRpcResponse),
    /// A notification was accepted; nothing is sent back
    Acknowledged,
}

impl Reply {
    /// The response envelope, if any
    pub fn into_response(self) -> Option<JsonRpcResponse> {
        match self {
            Self::Response(response) => Some(response),
            Self::Acknowledged => None,
        }
    }
}

/// Dispatcher that routes JSON-RPC requests to the appropriate handler
///
/// Stateless between calls. Transports feed raw bodies or parsed values in,
/// together with the tool server id they were addressed to, and send the
/// returned [`Reply`].
pub struct McpServer {
    state: SharedState,
}

impl McpServer {
    /// Create a dispatcher over the given shared state
    pub const fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Shared state backing this dispatcher
    pub const fn state(&self) -> &SharedState {
        &self.state
    }

    /// Parse a raw body and dispatch it
    pub async fn handle_body(&self, server_id: Option<&str>, body: &[u8]) -> Reply {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle_value(server_id, value).await,
            Err(e) => {
                error!(error = %e, "Failed to parse JSON-RPC body");
                Reply::Response(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                ))
            }
        }
    }

    /// Validate a parsed envelope and dispatch it
    pub async fn handle_value(&self, server_id: Option<&str>, value: Value) -> Reply {
        match JsonRpcRequest::from_value(value) {
            Ok(request) => self.handle_request(server_id, request).await,
            Err(rejection) => {
                debug!(code = ?rejection.error_code(), "Rejected malformed envelope");
                Reply::Response(rejection)
            }
        }
    }

    /// Dispatch a validated request in the context of `server_id`
    ///
    /// Notifications are acknowledged before the server context is resolved
    /// and are never dispatched.
    pub async fn handle_request(&self, server_id: Option<&str>, request: JsonRpcRequest) -> Reply {
        if request.is_notification() {
            debug!(method = %request.method, "Received notification, no response");
            return Reply::Acknowledged;
        }

        let server = match self.resolve_server(server_id, request.id.clone()).await {
            Ok(server) => server,
            Err(rejection) => return Reply::Response(rejection),
        };

        debug!(server_id = %server.id, method = %request.method, "Dispatching MCP request");

        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => Self::handle_initialize(id, request.params, &server),
            "tools/list" => self.handle_tools_list(id, &server).await,
            "tools/call" => self.handle_tools_call(id, request.params, &server).await,
            "ping" => JsonRpcResponse::success(id, Value::Object(Map::new())),
            method => {
                debug!(method, "Unknown MCP method");
                JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
            }
        };

        Reply::Response(response)
    }

    /// Look up the addressed tool server, rejecting missing or disabled ones
    async fn resolve_server(
        &self,
        server_id: Option<&str>,
        id: Option<Value>,
    ) -> Result<ToolServer, JsonRpcResponse> {
        let Some(server_id) = server_id.filter(|s| !s.is_empty()) else {
            return Err(JsonRpcResponse::error(
                id,
                MISSING_SERVER_CONTEXT,
                "Missing tool server context".to_owned(),
            ));
        };

        match self.state.repository().get_tool_server(server_id).await {
            Ok(Some(server)) if server.enabled => Ok(server),
            Ok(_) => Err(JsonRpcResponse::error(
                id,
                SERVER_NOT_FOUND,
                format!("Tool server not found: {server_id}"),
            )),
            Err(e) => {
                warn!(server_id, error = %e, "Failed to load tool server");
                Err(internal_error(id, &e))
            }
        }
    }

    /// Handle `initialize`: log client info and return server capabilities
    fn handle_initialize(
        id: Option<Value>,
        params: Option<Value>,
        server: &ToolServer,
    ) -> JsonRpcResponse {
        if let Some(params) = params {
            if let Ok(init) = serde_json::from_value::<InitializeParams>(params) {
                debug!(
                    server_id = %server.id,
                    client = ?init.client_info.as_ref().map(|c| c.name.as_str()),
                    client_version = ?init.client_info.as_ref().and_then(|c| c.version.as_deref()),
                    protocol = ?init.protocol_version,
                    "MCP client connected"
                );
            }
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: server.name.clone(),
                version: SERVER_VERSION.to_owned(),
            },
        };

        serialize_result(id, &result)
    }

    /// Handle `tools/list`: return the server's enabled tools
    async fn handle_tools_list(&self, id: Option<Value>, server: &ToolServer) -> JsonRpcResponse {
        match tools::list_tools(&self.state, &server.id).await {
            Ok(tools) => serialize_result(id, &ToolsListResult { tools }),
            Err(e) => {
                warn!(server_id = %server.id, error = %e, "Failed to list tools");
                internal_error(id, &e)
            }
        }
    }

    /// Handle `tools/call`: validate params, then execute the named tool
    async fn handle_tools_call(
        &self,
        id: Option<Value>,
        params: Option<Value>,
        server: &ToolServer,
    ) -> JsonRpcResponse {
        let params = match CallToolParams::from_params(params) {
            Ok(params) => params,
            Err(message) => return JsonRpcResponse::error(id, INVALID_PARAMS, message),
        };

        match tools::call_tool(&self.state, server, &params).await {
            Ok(result) => serialize_result(id, &result),
            Err(e) if e.kind == ErrorKind::NotFound => {
                debug!(server_id = %server.id, tool = %params.name, "Tool not found or disabled");
                JsonRpcResponse::error(id, TOOL_NOT_FOUND, e.message)
            }
            Err(e) => internal_error(id, &e),
        }
    }
}

fn serialize_result<T: Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(val) => JsonRpcResponse::success(id, val),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {e}")),
    }
}

fn internal_error(id: Option<Value>, err: &EngineError) -> JsonRpcResponse {
    let message = if err.kind == ErrorKind::ToolExecution {
        "Tool execution failed"
    } else {
        "Internal error"
    };
    JsonRpcResponse::error(id, INTERNAL_ERROR, message.to_owned()).with_data_message(&err.message)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use axum::routing::get;
    use axum::{Json, Router};
    use mockdeck::types::{AuthConfig, AuthType, ToolDefinition};
    use mockdeck::{EngineConfig, InMemoryRepository, ToolExecutor};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::protocol::{INVALID_REQUEST, PARSE_ERROR};
    use crate::state::ServerState;

    fn tool(name: &str, path: &str, enabled: bool) -> ToolDefinition {
        ToolDefinition {
            server_id: "s1".to_owned(),
            name: name.to_owned(),
            description: format!("{name} tool"),
            input_schema: None,
            method: "GET".to_owned(),
            base_url: None,
            path: path.to_owned(),
            query_mapping: BTreeMap::new(),
            body_mapping: BTreeMap::new(),
            header_mapping: BTreeMap::new(),
            enabled,
        }
    }

    fn build(base_url: &str) -> (McpServer, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        repo.add_server(ToolServer {
            id: "s1".to_owned(),
            name: "Users API".to_owned(),
            base_url: Some(base_url.to_owned()),
            enabled: true,
        });
        repo.add_server(ToolServer {
            id: "off".to_owned(),
            name: "Retired".to_owned(),
            base_url: None,
            enabled: false,
        });
        repo.add_tool(tool("getUser", "/users/{id}", true));
        repo.add_tool(tool("deleteAll", "/danger", false));

        let executor = ToolExecutor::new(&EngineConfig::default()).expect("executor");
        let state = Arc::new(ServerState::new(repo.clone(), executor));
        (McpServer::new(state), repo)
    }

    async fn call(server: &McpServer, server_id: Option<&str>, body: Value) -> JsonRpcResponse {
        server
            .handle_value(server_id, body)
            .await
            .into_response()
            .expect("response expected")
    }

    async fn spawn_upstream() -> String {
        async fn user(axum::extract::Path(id): axum::extract::Path<String>) -> Json<Value> {
            Json(json!({"id": id, "name": "Ada"}))
        }
        async fn missing() -> (axum::http::StatusCode, &'static str) {
            (axum::http::StatusCode::NOT_FOUND, "no such user")
        }

        let app = Router::new()
            .route("/users/{id}", get(user))
            .route("/missing", get(missing));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn initialize_reports_server_identity() {
        let (server, _) = build("http://unused");
        let resp = call(
            &server,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                   "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "test"}}}),
        )
        .await;
        let result = resp.result.expect("result");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "Users API");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[tokio::test]
    async fn tools_list_returns_enabled_tools_with_schema() {
        let (server, _) = build("http://unused");
        let resp = call(
            &server,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": "l", "method": "tools/list"}),
        )
        .await;
        let tools = resp.result.expect("result")["tools"].clone();
        let tools = tools.as_array().expect("array").clone();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "getUser");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn unknown_and_disabled_tools_are_not_found() {
        let (server, _) = build("http://unused");
        for name in ["nope", "deleteAll"] {
            let resp = call(
                &server,
                Some("s1"),
                json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                       "params": {"name": name, "arguments": {}}}),
            )
            .await;
            assert_eq!(resp.error_code(), Some(TOOL_NOT_FOUND), "tool {name}");
        }
    }

    #[tokio::test]
    async fn tools_call_wraps_payload_and_status() {
        let base = spawn_upstream().await;
        let (server, _) = build(&base);
        let resp = call(
            &server,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "getUser", "arguments": {"id": "7"}}}),
        )
        .await;
        assert_eq!(resp.id, json!(3));
        let result = resp.result.expect("result");
        let payload: Value =
            serde_json::from_str(result["content"][0]["text"].as_str().expect("text"))
                .expect("payload json");
        assert_eq!(payload["id"], "7");
        assert_eq!(result["content"][1]["text"], "HTTP 200");
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn upstream_non_2xx_is_a_flagged_result() {
        let base = spawn_upstream().await;
        let (server, repo) = build(&base);
        repo.add_tool(tool("lookup", "/missing", true));
        let resp = call(
            &server,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "lookup"}}),
        )
        .await;
        let result = resp.result.expect("result, not protocol error");
        assert_eq!(result["content"][0]["text"], "no such user");
        assert_eq!(result["content"][1]["text"], "HTTP 404");
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn transport_failure_is_internal_error_with_message() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let (server, repo) = build(&format!("http://{addr}"));
        repo.set_auth(
            "s1",
            AuthConfig {
                auth_type: AuthType::Bearer,
                bearer_token: Some("t".to_owned()),
                ..AuthConfig::default()
            },
        );
        let resp = call(
            &server,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call",
                   "params": {"name": "getUser", "arguments": {"id": "1"}}}),
        )
        .await;
        let error = resp.error.expect("error");
        assert_eq!(error.code, INTERNAL_ERROR);
        let detail = error.data.expect("data")["message"].clone();
        assert!(detail.as_str().is_some_and(|m| m.contains("getUser")));
    }

    #[tokio::test]
    async fn invalid_call_params_are_rejected() {
        let (server, _) = build("http://unused");
        for params in [json!(null), json!({"name": 1}), json!({"name": "getUser", "arguments": "x"})] {
            let resp = call(
                &server,
                Some("s1"),
                json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": params}),
            )
            .await;
            assert_eq!(resp.error_code(), Some(INVALID_PARAMS));
        }
    }

    #[tokio::test]
    async fn ping_and_unknown_method() {
        let (server, _) = build("http://unused");
        let pong = call(&server, Some("s1"), json!({"jsonrpc": "2.0", "id": 7, "method": "ping"})).await;
        assert_eq!(pong.result, Some(json!({})));

        let unknown = call(
            &server,
            Some("s1"),
            json!({"jsonrpc": "2.0", "id": 8, "method": "resources/list"}),
        )
        .await;
        assert_eq!(unknown.error_code(), Some(METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn notifications_are_never_answered() {
        let (server, _) = build("http://unused");
        for (server_id, method) in [
            (Some("s1"), "tools/call"),
            (Some("s1"), "notifications/initialized"),
            (None, "ping"),
            (Some("ghost"), "tools/list"),
        ] {
            let reply = server
                .handle_value(server_id, json!({"jsonrpc": "2.0", "method": method}))
                .await;
            assert!(matches!(reply, Reply::Acknowledged), "{method}");
        }
    }

    #[tokio::test]
    async fn server_context_errors() {
        let (server, _) = build("http://unused");
        let body = json!({"jsonrpc": "2.0", "id": 9, "method": "tools/list"});

        let missing = call(&server, None, body.clone()).await;
        assert_eq!(missing.error_code(), Some(MISSING_SERVER_CONTEXT));

        let unknown = call(&server, Some("ghost"), body.clone()).await;
        assert_eq!(unknown.error_code(), Some(SERVER_NOT_FOUND));

        let disabled = call(&server, Some("off"), body).await;
        assert_eq!(disabled.error_code(), Some(SERVER_NOT_FOUND));
    }

    #[tokio::test]
    async fn envelope_is_validated_before_server_context() {
        let (server, _) = build("http://unused");
        let resp = call(&server, None, json!({"jsonrpc": "1.0", "id": 1, "method": "ping"})).await;
        assert_eq!(resp.error_code(), Some(INVALID_REQUEST));

        let parse = server
            .handle_body(Some("s1"), b"{not json")
            .await
            .into_response()
            .expect("response");
        assert_eq!(parse.error_code(), Some(PARSE_ERROR));
        assert_eq!(parse.id, Value::Null);
    }
}
