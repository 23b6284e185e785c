// ABOUTME: GET /__mockdeck/health handler reporting repository reachability and route count
// ABOUTME: Returns HTTP 200 when enabled routes can be listed, 503 when the repository fails
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::state::SharedState;

/// Path of the health endpoint, kept out of the way of mock routes
pub const HEALTH_PATH: &str = "/__mockdeck/health";

/// Health response body
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: &'static str,
    /// Number of enabled mock routes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<usize>,
    /// Server version
    pub version: &'static str,
}

/// Handle GET /__mockdeck/health
pub async fn handle(State(state): State<SharedState>) -> impl IntoResponse {
    match state.repository().list_enabled_routes().await {
        Ok(routes) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                routes: Some(routes.len()),
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check could not list routes");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    routes: None,
                    version: env!("CARGO_PKG_VERSION"),
                }),
            )
        }
    }
}
