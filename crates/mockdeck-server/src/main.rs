// ABOUTME: CLI entry point for the mockdeck server binary
// ABOUTME: Parses arguments, loads fixtures, builds shared state, and starts the axum HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mockdeck::config::{parse_timeout, resolve_fixtures};
use mockdeck::types::EngineError;
use mockdeck::EngineConfig;

use mockdeck_server::router;
use mockdeck_server::state::ServerState;

/// mockdeck-server: templated mock routes plus JSON-RPC tool endpoints
#[derive(Parser)]
#[command(name = "mockdeck-server", version, about)]
struct Cli {
    /// HTTP listen port
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// HTTP listen host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// TOML fixture file with routes, variables, tool servers, tools, and auth
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Outbound tool call timeout in seconds
    #[arg(long, default_value = "30", value_parser = parse_timeout)]
    outbound_timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let repository = resolve_fixtures(cli.fixtures.as_deref())?;
    let config = EngineConfig::default().with_outbound_timeout(cli.outbound_timeout);
    let state = Arc::new(ServerState::new(Arc::new(repository), &config)?);
    let app = router::build(state);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EngineError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(
        address = %addr,
        outbound_timeout = ?cli.outbound_timeout,
        "Starting mockdeck server"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| EngineError::internal(format!("Server error: {e}")))?;

    Ok(())
}
