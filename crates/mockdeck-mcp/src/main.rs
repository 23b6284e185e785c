// ABOUTME: CLI entry point for the standalone mockdeck tool bridge binary
// ABOUTME: Parses arguments, loads fixtures, selects transport (stdio or HTTP), and starts serving
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use mockdeck::config::{parse_timeout, resolve_fixtures};
use mockdeck::types::EngineError;
use mockdeck::{EngineConfig, ToolExecutor};
use mockdeck_mcp::transport::http::HttpTransport;
use mockdeck_mcp::transport::stdio::StdioTransport;
use mockdeck_mcp::transport::McpTransport;
use mockdeck_mcp::{McpServer, ServerState};

/// mockdeck-mcp: expose stored HTTP tools via Model Context Protocol
#[derive(Parser)]
#[command(name = "mockdeck-mcp", version, about)]
struct Cli {
    /// Transport mode: "stdio" for stdin/stdout or "http" for HTTP+SSE
    #[arg(long, default_value = "stdio")]
    transport: String,

    /// Tool server id served over stdio (required with --transport stdio)
    #[arg(long)]
    server: Option<String>,

    /// HTTP listen port (only used with --transport http)
    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// HTTP listen host (only used with --transport http)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// TOML fixture file with tool servers, tools, and auth configs
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Outbound tool call timeout in seconds
    #[arg(long, default_value = "30", value_parser = parse_timeout)]
    outbound_timeout: std::time::Duration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr to keep stdout clean for stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let repository = resolve_fixtures(cli.fixtures.as_deref())?;
    let config = EngineConfig::default().with_outbound_timeout(cli.outbound_timeout);
    let executor = ToolExecutor::new(&config)?;
    let state = Arc::new(ServerState::new(Arc::new(repository), executor));
    let server = Arc::new(McpServer::new(state));

    tracing::info!(
        transport = %cli.transport,
        server_id = ?cli.server,
        "Starting mockdeck MCP server"
    );

    match cli.transport.as_str() {
        "stdio" => {
            let server_id = cli.server.ok_or_else(|| {
                EngineError::config("--server <id> is required with --transport stdio")
            })?;
            StdioTransport::new(server_id).serve(server).await?;
        }
        "http" => {
            HttpTransport::new(cli.host, cli.port).serve(server).await?;
        }
        other => {
            return Err(EngineError::config(format!(
                "Unknown transport: {other}. Valid: stdio, http"
            ))
            .into());
        }
    }

    Ok(())
}
