// ABOUTME: Tool bridge listing a server's stored tools and invoking them through the outbound executor
// ABOUTME: Converts upstream HTTP responses into MCP content parts with a payload and a status marker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

pub mod schema;

use mockdeck::types::{EngineError, ToolResponse, ToolServer};
use tracing::debug;

use crate::protocol::{CallToolParams, CallToolResult, ContentPart, ToolDescriptor};
use crate::state::ServerState;

/// Enabled tools of `server_id` as `tools/list` descriptors
pub async fn list_tools(
    state: &ServerState,
    server_id: &str,
) -> Result<Vec<ToolDescriptor>, EngineError> {
    let tools = state.repository().list_enabled_tools(server_id).await?;
    Ok(tools
        .into_iter()
        .filter(|tool| tool.enabled)
        .map(|tool| ToolDescriptor {
            input_schema: schema::normalize_input_schema(tool.input_schema.as_ref()),
            name: tool.name,
            description: tool.description,
        })
        .collect())
}

/// Look up and execute one tool on `server`
///
/// Unknown and disabled tools are both `NotFound`, and neither reaches the
/// network. Upstream non-2xx statuses come back as results flagged
/// `isError`; only transport failures are errors.
pub async fn call_tool(
    state: &ServerState,
    server: &ToolServer,
    params: &CallToolParams,
) -> Result<CallToolResult, EngineError> {
    let tool = state
        .repository()
        .get_tool_by_name(&server.id, &params.name)
        .await?
        .filter(|tool| tool.enabled)
        .ok_or_else(|| EngineError::not_found(format!("Tool not found: {}", params.name)))?;

    let auth = state.repository().get_auth_config(&server.id).await?;

    debug!(server_id = %server.id, tool = %tool.name, "Executing tool");
    let response = state
        .executor()
        .execute(server, &tool, auth.as_ref(), &params.arguments)
        .await?;

    Ok(render_result(&response))
}

/// Two content parts: the payload (pretty JSON or raw text) and `HTTP <status>`
pub fn render_result(response: &ToolResponse) -> CallToolResult {
    let payload = response
        .json
        .as_ref()
        .and_then(|json| serde_json::to_string_pretty(json).ok())
        .unwrap_or_else(|| response.raw_body.clone());

    CallToolResult {
        content: vec![
            ContentPart::text(payload),
            ContentPart::text(format!("HTTP {}", response.status)),
        ],
        is_error: !response.is_success(),
    }
}
