// ABOUTME: Catch-all handler feeding every non-reserved request into the mock response pipeline
// ABOUTME: Converts axum requests to engine requests and engine responses back to HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::collections::BTreeMap;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use mockdeck::types::{MockRequest, MockResponse};
use tracing::warn;

use crate::state::SharedState;

/// Serve a request from the stored mock routes
pub async fn handle(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = to_mock_request(&method, &uri, &headers, &body);
    let response = state.engine().handle(request).await;
    into_http_response(response)
}

/// Build the engine's view of an inbound request
pub fn to_mock_request(method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) -> MockRequest {
    MockRequest {
        method: method.as_str().to_owned(),
        path: uri.path().to_owned(),
        query: first_query_values(uri.query().unwrap_or_default()),
        headers: lowercase_headers(headers),
        body: String::from_utf8_lossy(body).into_owned(),
    }
}

/// Decode a query string keeping the first value of repeated keys
fn first_query_values(query: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        values
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    values
}

fn lowercase_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            out.entry(name.as_str().to_ascii_lowercase())
                .or_insert_with(|| value.to_owned());
        }
    }
    out
}

/// Emit an engine response, skipping headers HTTP cannot carry
pub fn into_http_response(response: MockResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    let mut http = (status, Body::from(response.body)).into_response();
    let out = http.headers_mut();
    for (name, value) in response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                out.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid mock response header"),
        }
    }
    http
}
