// ABOUTME: Optional bearer token authentication middleware for the protocol endpoints
// ABOUTME: Enforces MOCKDECK_MCP_KEY when set, allows unauthenticated access otherwise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Environment variable name for the protocol API key
pub const API_KEY_ENV: &str = "MOCKDECK_MCP_KEY";

/// Middleware that validates the bearer token against `MOCKDECK_MCP_KEY`
///
/// The env var is read on every request to allow runtime key rotation
/// without restarting the server. If the variable is unset or empty, all
/// requests are allowed through. Mock traffic never passes through here.
pub async fn require_auth(request: Request, next: Next) -> Response {
    let expected_key = match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => key,
        _ => return next.run(request).await,
    };

    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected_key.as_bytes())) => {
            next.run(request).await
        }
        Some(_) => auth_error("Invalid API key"),
        None if auth_header.is_some() => auth_error("Authorization header must use Bearer scheme"),
        None => auth_error("Missing Authorization header"),
    }
}

/// Build a 401 error response
fn auth_error(message: &str) -> Response {
    debug!(reason = message, "Rejected protocol request");
    let body = json!({
        "error": {
            "type": "authentication_error",
            "message": message,
        }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

