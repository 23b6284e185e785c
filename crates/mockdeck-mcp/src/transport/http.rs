// ABOUTME: HTTP transport serving one JSON-RPC endpoint per tool server with JSON or SSE replies
// ABOUTME: Enforces the JSON content type and maps envelope-level rejections to HTTP statuses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::stream;
use mockdeck::types::EngineError;
use tracing::{debug, info, warn};

use crate::protocol::{
    JsonRpcResponse, INVALID_REQUEST, MISSING_SERVER_CONTEXT, PARSE_ERROR, SERVER_NOT_FOUND,
};
use crate::server::{McpServer, Reply};
use crate::transport::McpTransport;

/// Build the protocol routes: `POST /mcp/{server_id}` and the context-less `POST /mcp`
pub fn routes(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(handle_unscoped_post))
        .route("/mcp/{server_id}", post(handle_scoped_post))
        .with_state(server)
}

/// Transport over HTTP using axum
///
/// Supports both `application/json` and `text/event-stream` response
/// formats based on the client's `Accept` header.
pub struct HttpTransport {
    host: String,
    port: u16,
}

impl HttpTransport {
    /// Create an HTTP transport bound to the given host and port
    pub const fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn serve(self, server: Arc<McpServer>) -> Result<(), EngineError> {
        let app = routes(server);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| EngineError::internal(format!("Failed to bind {addr}: {e}")))?;

        info!(address = %addr, "HTTP transport listening");

        axum::serve(listener, app)
            .await
            .map_err(|e| EngineError::internal(format!("HTTP server error: {e}")))?;

        Ok(())
    }
}

async fn handle_scoped_post(
    State(server): State<Arc<McpServer>>,
    Path(server_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle_post(&server, Some(&server_id), &headers, &body).await
}

async fn handle_unscoped_post(
    State(server): State<Arc<McpServer>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle_post(&server, None, &headers, &body).await
}

/// Check the content type, dispatch, and frame the reply
async fn handle_post(
    server: &McpServer,
    server_id: Option<&str>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    if !is_json_content_type(headers) {
        warn!(server_id = ?server_id, "Rejected protocol request with non-JSON content type");
        let response = JsonRpcResponse::error(
            None,
            PARSE_ERROR,
            "Content-Type must be application/json".to_owned(),
        );
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, Json(response)).into_response();
    }

    let Reply::Response(response) = server.handle_body(server_id, body).await else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let status = status_for(&response);
    debug!(server_id = ?server_id, status = status.as_u16(), "Sending protocol response");

    if wants_sse(headers) {
        (status, respond_sse(&response)).into_response()
    } else {
        (status, Json(response)).into_response()
    }
}

/// HTTP status for a response: envelope-level rejections are non-200
pub fn status_for(response: &JsonRpcResponse) -> StatusCode {
    match response.error_code() {
        Some(PARSE_ERROR | INVALID_REQUEST | MISSING_SERVER_CONTEXT) => StatusCode::BAD_REQUEST,
        Some(SERVER_NOT_FOUND) => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn wants_sse(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}

/// Wrap a JSON-RPC response in a single SSE event
fn respond_sse(response: &JsonRpcResponse) -> Response {
    let data = serde_json::to_string(response).unwrap_or_else(|e| {
        format!(
            r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":-32603,"message":"Serialization failed: {e}"}}}}"#
        )
    });

    let event = Event::default().data(data);
    let event_stream = stream::once(async { Ok::<_, Infallible>(event) });

    Sse::new(event_stream).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;
    use crate::protocol::{INTERNAL_ERROR, METHOD_NOT_FOUND, TOOL_NOT_FOUND};

    #[test]
    fn envelope_rejections_map_to_client_errors() {
        let status = |code| status_for(&JsonRpcResponse::error(None, code, String::new()));
        assert_eq!(status(PARSE_ERROR), StatusCode::BAD_REQUEST);
        assert_eq!(status(INVALID_REQUEST), StatusCode::BAD_REQUEST);
        assert_eq!(status(MISSING_SERVER_CONTEXT), StatusCode::BAD_REQUEST);
        assert_eq!(status(SERVER_NOT_FOUND), StatusCode::NOT_FOUND);
        assert_eq!(status(METHOD_NOT_FOUND), StatusCode::OK);
        assert_eq!(status(TOOL_NOT_FOUND), StatusCode::OK);
        assert_eq!(status(INTERNAL_ERROR), StatusCode::OK);
    }

    #[test]
    fn content_type_accepts_parameters() {
        let mut headers = HeaderMap::new();
        assert!(!is_json_content_type(&headers));

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        assert!(is_json_content_type(&headers));

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!is_json_content_type(&headers));
    }
}
