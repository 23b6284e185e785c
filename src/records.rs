// ABOUTME: Stored-row shapes with stringly-typed JSON columns and their lenient decoding
// ABOUTME: Converts raw repository rows into typed route, tool, and auth definitions exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

//! # Stored Records
//!
//! The dashboard persists header maps, mappings, and schemas as JSON text.
//! These row types mirror that storage shape; the `into_*` conversions parse
//! every text column up front. Malformed text never aborts a request: it
//! degrades to an empty default and emits a warning.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::types::{
    AuthConfig, AuthType, MockRouteDefinition, RouteVariable, ToolDefinition, ToolServer,
};

/// Status used when a stored route has no usable status code
const DEFAULT_STATUS: u16 = 200;

const fn default_true() -> bool {
    true
}

/// A mock route row as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredRoute {
    /// Route identity
    pub id: String,
    /// HTTP method
    #[serde(default)]
    pub method: String,
    /// Path pattern
    pub path: String,
    /// Enabled flag
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// JSON object text of required headers
    #[serde(default)]
    pub match_headers: Option<String>,
    /// Response status
    #[serde(default)]
    pub status: Option<i64>,
    /// JSON object text of response headers
    #[serde(default)]
    pub response_headers: Option<String>,
    /// Response body or template source
    #[serde(default)]
    pub body: Option<String>,
    /// Body is JSON
    #[serde(default)]
    pub is_json: bool,
    /// Body is a template
    #[serde(default)]
    pub templating: bool,
    /// Artificial delay in milliseconds
    #[serde(default)]
    pub delay_ms: Option<i64>,
}

impl StoredRoute {
    /// Decode into a typed route definition
    pub fn into_definition(self) -> MockRouteDefinition {
        let context = format!("route {}", self.id);
        let status = self
            .status
            .and_then(|s| u16::try_from(s).ok())
            .filter(|s| (100..=599).contains(s))
            .unwrap_or_else(|| {
                if self.status.is_some() {
                    warn!(route_id = %self.id, status = ?self.status, "Stored status out of range, using 200");
                }
                DEFAULT_STATUS
            });

        MockRouteDefinition {
            match_headers: parse_string_map(self.match_headers.as_deref(), &context),
            response_headers: parse_string_map(self.response_headers.as_deref(), &context),
            method: normalize_method(&self.method),
            path: self.path,
            enabled: self.enabled,
            status,
            body: self.body.unwrap_or_default(),
            is_json: self.is_json,
            templating: self.templating,
            delay_ms: self
                .delay_ms
                .and_then(|d| u64::try_from(d).ok())
                .unwrap_or(0),
            id: self.id,
        }
    }
}

/// A route variable row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVariable {
    /// Owning route
    pub route_id: String,
    /// Variable key
    pub key: String,
    /// Variable value
    #[serde(default)]
    pub value: String,
}

impl StoredVariable {
    /// Decode into a typed variable
    pub fn into_variable(self) -> RouteVariable {
        RouteVariable::new(self.route_id, self.key, self.value)
    }
}

/// A tool server row as stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToolServer {
    /// Server identity
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Default base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Enabled flag
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl StoredToolServer {
    /// Decode into a typed tool server
    pub fn into_server(self) -> ToolServer {
        ToolServer {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            base_url: non_empty(self.base_url),
            enabled: self.enabled,
            id: self.id,
        }
    }
}

/// A tool row as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTool {
    /// Owning tool server
    pub server_id: String,
    /// Tool name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// JSON text of the input schema
    #[serde(default)]
    pub input_schema: Option<String>,
    /// HTTP method
    #[serde(default)]
    pub method: String,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Path template
    #[serde(default)]
    pub path: String,
    /// JSON object text: query key → argument key
    #[serde(default)]
    pub query_mapping: Option<String>,
    /// JSON object text: body key → argument key
    #[serde(default)]
    pub body_mapping: Option<String>,
    /// JSON object text: static headers
    #[serde(default)]
    pub header_mapping: Option<String>,
    /// Enabled flag
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl StoredTool {
    /// Decode into a typed tool definition
    pub fn into_definition(self) -> ToolDefinition {
        let context = format!("tool {}/{}", self.server_id, self.name);
        let input_schema = self.input_schema.as_deref().and_then(|raw| {
            if raw.trim().is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(context = %context, error = %e, "Stored input schema is not valid JSON, ignoring");
                    None
                }
            }
        });

        ToolDefinition {
            description: self.description.unwrap_or_default(),
            input_schema,
            method: normalize_method(&self.method),
            base_url: non_empty(self.base_url),
            path: self.path,
            query_mapping: parse_string_map(self.query_mapping.as_deref(), &context),
            body_mapping: parse_string_map(self.body_mapping.as_deref(), &context),
            header_mapping: parse_string_map(self.header_mapping.as_deref(), &context),
            enabled: self.enabled,
            server_id: self.server_id,
            name: self.name,
        }
    }
}

/// An auth config row as stored
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredAuthConfig {
    /// Owning tool server
    pub server_id: String,
    /// Scheme name (`none`, `api_key_header`, `api_key_query`, `bearer`, `basic`)
    #[serde(default)]
    pub auth_type: String,
    /// API key header/query name
    #[serde(default)]
    pub api_key_name: Option<String>,
    /// API key value
    #[serde(default)]
    pub api_key_value: Option<String>,
    /// Bearer token
    #[serde(default)]
    pub bearer_token: Option<String>,
    /// Basic username
    #[serde(default)]
    pub basic_username: Option<String>,
    /// Basic password
    #[serde(default)]
    pub basic_password: Option<String>,
    /// JSON object text of extra headers
    #[serde(default)]
    pub extra_headers: Option<String>,
}

impl StoredAuthConfig {
    /// Decode into a typed auth config
    ///
    /// An unknown scheme name decodes to `none` so the extra headers still apply.
    pub fn into_config(self) -> AuthConfig {
        let auth_type = AuthType::parse(&self.auth_type).unwrap_or_else(|| {
            warn!(server_id = %self.server_id, auth_type = %self.auth_type, "Unknown auth type, treating as none");
            AuthType::None
        });
        let context = format!("auth {}", self.server_id);

        AuthConfig {
            auth_type,
            api_key_name: non_empty(self.api_key_name),
            api_key_value: non_empty(self.api_key_value),
            bearer_token: non_empty(self.bearer_token),
            basic_username: non_empty(self.basic_username),
            basic_password: self.basic_password,
            extra_headers: parse_string_map(self.extra_headers.as_deref(), &context),
        }
    }
}

/// Everything a fixture file can hold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredDataset {
    /// Mock routes
    #[serde(default)]
    pub routes: Vec<StoredRoute>,
    /// Route variables
    #[serde(default)]
    pub variables: Vec<StoredVariable>,
    /// Tool servers
    #[serde(default)]
    pub servers: Vec<StoredToolServer>,
    /// Tools
    #[serde(default)]
    pub tools: Vec<StoredTool>,
    /// Auth configs
    #[serde(default)]
    pub auth: Vec<StoredAuthConfig>,
}

/// Parse stored JSON object text into a string map
///
/// Missing or blank text is an empty map. Invalid JSON, non-object JSON, and
/// non-string values are dropped with a warning.
pub fn parse_string_map(raw: Option<&str>, context: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return map;
    };

    let object = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!(context, kind = %json_kind(&other), "Stored map is not a JSON object, using empty map");
            return map;
        }
        Err(e) => {
            warn!(context, error = %e, "Stored map is not valid JSON, using empty map");
            return map;
        }
    };

    for (key, value) in object {
        match value {
            Value::String(s) => {
                map.insert(key, s);
            }
            other => {
                warn!(context, key = %key, kind = %json_kind(&other), "Dropping non-string map value");
            }
        }
    }
    map
}

/// Upper-case a stored method name, defaulting to GET
pub fn normalize_method(method: &str) -> String {
    let trimmed = method.trim();
    if trimmed.is_empty() {
        "GET".to_owned()
    } else {
        trimmed.to_uppercase()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_header_json_becomes_empty_map() {
        assert!(parse_string_map(Some("{not json"), "test").is_empty());
        assert!(parse_string_map(Some("[1,2]"), "test").is_empty());
        assert!(parse_string_map(None, "test").is_empty());
        assert!(parse_string_map(Some("  "), "test").is_empty());
    }

    #[test]
    fn string_map_keeps_only_string_values() {
        let map = parse_string_map(Some(r#"{"x-a":"1","x-b":2,"x-c":null}"#), "test");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("x-a").map(String::as_str), Some("1"));
    }

    #[test]
    fn stored_route_decodes_with_defaults() {
        let route = StoredRoute {
            id: "r1".to_owned(),
            method: " post ".to_owned(),
            path: "/users".to_owned(),
            enabled: true,
            match_headers: Some("broken".to_owned()),
            status: Some(999),
            response_headers: Some(r#"{"X-Mock":"yes"}"#.to_owned()),
            body: None,
            is_json: true,
            templating: false,
            delay_ms: Some(-5),
        }
        .into_definition();

        assert_eq!(route.method, "POST");
        assert_eq!(route.status, 200);
        assert!(route.match_headers.is_empty());
        assert_eq!(route.response_headers.get("X-Mock").map(String::as_str), Some("yes"));
        assert_eq!(route.body, "");
        assert_eq!(route.delay_ms, 0);
    }

    #[test]
    fn stored_tool_ignores_bad_schema() {
        let tool = StoredTool {
            server_id: "s1".to_owned(),
            name: "getUser".to_owned(),
            input_schema: Some("{oops".to_owned()),
            query_mapping: Some(r#"{"q":"search"}"#.to_owned()),
            enabled: true,
            ..StoredTool::default()
        }
        .into_definition();

        assert!(tool.input_schema.is_none());
        assert_eq!(tool.method, "GET");
        assert_eq!(tool.query_mapping.get("q").map(String::as_str), Some("search"));
        assert!(tool.enabled);
    }

    #[test]
    fn unknown_auth_type_keeps_extra_headers() {
        let auth = StoredAuthConfig {
            server_id: "s1".to_owned(),
            auth_type: "digest".to_owned(),
            extra_headers: Some(r#"{"X-Team":"core"}"#.to_owned()),
            ..StoredAuthConfig::default()
        }
        .into_config();

        assert_eq!(auth.auth_type, AuthType::None);
        assert_eq!(auth.extra_headers.get("X-Team").map(String::as_str), Some("core"));
    }

    #[test]
    fn server_name_defaults_to_id() {
        let server = StoredToolServer {
            id: "billing".to_owned(),
            name: None,
            base_url: Some(String::new()),
            enabled: true,
        }
        .into_server();
        assert_eq!(server.name, "billing");
        assert!(server.base_url.is_none());
    }
}
