// ABOUTME: Axum router wiring protocol endpoints, the health check, and the mock fallback
// ABOUTME: Applies the optional bearer auth middleware to protocol endpoints only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use axum::middleware;
use axum::routing::get;
use axum::Router;
use mockdeck_mcp::transport::http as mcp_http;

use crate::auth;
use crate::health;
use crate::mock;
use crate::state::SharedState;

/// Build the application router with all endpoints
///
/// Routes:
/// - `POST /mcp/{server_id}`: JSON-RPC tool bridge for one tool server
/// - `POST /mcp`: answers with a missing server context error
/// - `GET /__mockdeck/health`: repository health check
/// - anything else: mock response pipeline
///
/// The auth middleware guards the protocol routes only. It enforces
/// authentication when `MOCKDECK_MCP_KEY` is set.
pub fn build(state: SharedState) -> Router {
    let protocol =
        mcp_http::routes(state.mcp()).layer(middleware::from_fn(auth::require_auth));

    Router::new()
        .route(health::HEALTH_PATH, get(health::handle))
        .fallback(mock::handle)
        .with_state(state)
        .merge(protocol)
}
