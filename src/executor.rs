// ABOUTME: Outbound tool executor turning a tool definition and call arguments into an HTTP request
// ABOUTME: Applies path/query/body/header mappings plus auth, then normalizes the upstream response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use url::Url;

use crate::auth;
use crate::config::EngineConfig;
use crate::types::{AuthConfig, EngineError, ToolCallArguments, ToolDefinition, ToolResponse, ToolServer};

/// A fully-resolved outbound request, before it is sent
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL including query string
    pub url: Url,
    /// Headers, unique by case-insensitive name
    pub headers: Vec<(String, String)>,
    /// JSON body, `None` for methods that never carry one
    pub body: Option<Value>,
}

/// Issues outbound HTTP calls on behalf of protocol tool invocations
///
/// One shared `reqwest` client; every call is bounded by the configured
/// timeout, which covers connect, send, and the full body read.
#[derive(Clone)]
pub struct ToolExecutor {
    client: Client,
    timeout: Duration,
}

impl ToolExecutor {
    /// Create an executor from engine settings
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.outbound_timeout)
            .build()
            .map_err(|e| EngineError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout: config.outbound_timeout,
        })
    }

    /// Build and send the request for `tool`, returning the normalized response
    ///
    /// Any upstream status is a successful result; only transport failures
    /// (refused, timeout, DNS, unreadable body) are `ToolExecution` errors.
    pub async fn execute(
        &self,
        server: &ToolServer,
        tool: &ToolDefinition,
        auth: Option<&AuthConfig>,
        arguments: &ToolCallArguments,
    ) -> Result<ToolResponse, EngineError> {
        let outbound = build_request(server, tool, auth, arguments)?;
        debug!(tool = %tool.name, method = %outbound.method, url = %outbound.url, "Sending outbound tool request");

        let mut request = self
            .client
            .request(outbound.method, outbound.url)
            .headers(header_map(&outbound.headers));
        if let Some(body) = &outbound.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(tool, &e))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect::<BTreeMap<_, _>>();
        let raw_body = response.text().await.map_err(|e| self.transport_error(tool, &e))?;
        let json = serde_json::from_str::<Value>(&raw_body).ok();

        debug!(tool = %tool.name, status, bytes = raw_body.len(), "Outbound tool request completed");

        Ok(ToolResponse {
            status,
            headers,
            raw_body,
            json,
        })
    }

    fn transport_error(&self, tool: &ToolDefinition, err: &reqwest::Error) -> EngineError {
        let message = if err.is_timeout() {
            format!("request timed out after {:?}", self.timeout)
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        error!(tool = %tool.name, error = %message, "Outbound tool request failed");
        EngineError::tool_execution(&tool.name, message)
    }
}

/// Resolve URL, query, headers, and body for one invocation
///
/// Only mapped arguments reach the query string. The body is the projection
/// through the body mapping when one exists, otherwise the full argument map,
/// and is omitted for `GET`, `HEAD`, and `OPTIONS`. Auth is layered last: its
/// headers replace same-named mapped headers and its query pair replaces a
/// same-named mapped pair.
pub fn build_request(
    server: &ToolServer,
    tool: &ToolDefinition,
    auth: Option<&AuthConfig>,
    arguments: &ToolCallArguments,
) -> Result<OutboundRequest, EngineError> {
    let method = Method::from_bytes(tool.method.as_bytes())
        .map_err(|_| EngineError::config(format!("Invalid HTTP method: {}", tool.method)))?;

    let base_url = tool
        .base_url
        .as_deref()
        .or(server.base_url.as_deref())
        .ok_or_else(|| EngineError::tool_execution(&tool.name, "no base URL configured"))?;

    let path = substitute_path(&tool.path, arguments);
    let joined = if path.is_empty() {
        base_url.to_owned()
    } else if path.starts_with('/') {
        format!("{}{path}", base_url.trim_end_matches('/'))
    } else {
        format!("{}/{path}", base_url.trim_end_matches('/'))
    };
    let mut url =
        Url::parse(&joined).map_err(|e| EngineError::config(format!("Invalid URL {joined}: {e}")))?;

    let injection = auth::inject(auth);

    let mut query: Vec<(String, String)> = tool
        .query_mapping
        .iter()
        .filter(|(target, _)| !injection.query.iter().any(|(k, _)| k == *target))
        .filter_map(|(target, arg)| {
            arguments
                .get(arg)
                .and_then(value_to_string)
                .map(|v| (target.clone(), v))
        })
        .collect();
    query.extend(injection.query.iter().cloned());
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &query {
            pairs.append_pair(key, value);
        }
    }

    let mut headers: Vec<(String, String)> = Vec::new();
    for (name, value) in tool.header_mapping.iter().chain(
        injection
            .headers
            .iter()
            .map(|(name, value)| (name, value)),
    ) {
        headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        headers.push((name.clone(), value.clone()));
    }

    let body = carries_body(&method).then(|| {
        if tool.body_mapping.is_empty() {
            Value::Object(arguments.clone())
        } else {
            let projected: Map<String, Value> = tool
                .body_mapping
                .iter()
                .filter_map(|(target, arg)| arguments.get(arg).map(|v| (target.clone(), v.clone())))
                .collect();
            Value::Object(projected)
        }
    });

    Ok(OutboundRequest {
        method,
        url,
        headers,
        body,
    })
}

/// Replace `{name}` and `:name` placeholders with percent-encoded argument values
///
/// `:name` is recognized only at the start of a path segment. Placeholders
/// without a matching (non-null) argument are left as written.
pub fn substitute_path(template: &str, arguments: &ToolCallArguments) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        let at_segment_start = out.is_empty() || out.ends_with('/');

        if ch == '{' {
            if let Some(end) = rest.find('}') {
                let name = &rest[1..end];
                if is_placeholder_name(name) {
                    if let Some(value) = arguments.get(name).and_then(value_to_string) {
                        out.push_str(&encode_path_segment(&value));
                        rest = &rest[end + 1..];
                        continue;
                    }
                }
            }
        } else if ch == ':' && at_segment_start {
            let name_len = rest[1..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(rest.len() - 1);
            let name = &rest[1..=name_len];
            if is_placeholder_name(name) {
                if let Some(value) = arguments.get(name).and_then(value_to_string) {
                    out.push_str(&encode_path_segment(&value));
                    rest = &rest[1 + name_len..];
                    continue;
                }
            }
        }

        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_path_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Text form of an argument; `null` counts as absent
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn header_map(headers: &[(String, String)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid outbound header"),
        }
    }
    map
}
