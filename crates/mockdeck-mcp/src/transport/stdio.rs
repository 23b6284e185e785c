// ABOUTME: Stdio transport reading newline-delimited JSON-RPC from stdin and writing to stdout
// ABOUTME: Serves a single tool server fixed at startup, for editor and CLI integrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::sync::Arc;

use async_trait::async_trait;
use mockdeck::types::EngineError;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::protocol::JsonRpcResponse;
use crate::server::{McpServer, Reply};
use crate::transport::McpTransport;

/// Transport over stdin/stdout using newline-delimited JSON-RPC
///
/// Each line on stdin is one message addressed to `server_id`. Responses
/// are written as single lines to stdout; logs go to stderr.
pub struct StdioTransport {
    server_id: String,
}

impl StdioTransport {
    /// Create a stdio transport scoped to one tool server
    pub const fn new(server_id: String) -> Self {
        Self { server_id }
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn serve(self, server: Arc<McpServer>) -> Result<(), EngineError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut lines = stdin.lines();

        debug!(server_id = %self.server_id, "Stdio transport ready, waiting for JSON-RPC messages on stdin");

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }

            if let Reply::Response(response) =
                server.handle_body(Some(&self.server_id), line.as_bytes()).await
            {
                write_response(&mut stdout, &response).await?;
            }
        }

        debug!("Stdin closed, shutting down stdio transport");
        Ok(())
    }
}

/// Serialize and write a JSON-RPC response as a single line
async fn write_response<W: AsyncWrite + Unpin + Send>(
    out: &mut W,
    response: &JsonRpcResponse,
) -> Result<(), EngineError> {
    let json = serde_json::to_string(response)
        .map_err(|e| EngineError::internal(format!("JSON serialization failed: {e}")))?;

    out.write_all(json.as_bytes())
        .await
        .map_err(|e| EngineError::internal(format!("stdout write failed: {e}")))?;

    out.write_all(b"\n")
        .await
        .map_err(|e| EngineError::internal(format!("stdout newline write failed: {e}")))?;

    out.flush()
        .await
        .map_err(|e| EngineError::internal(format!("stdout flush failed: {e}")))?;

    Ok(())
}
