// ABOUTME: Core types for the mock route engine and tool bridge: errors and the in-memory data model
// ABOUTME: Provides EngineError, route/variable/tool/auth definitions, and request/response shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

//! # Core Types
//!
//! Typed, validated shapes for everything the engine borrows from the
//! external repository. Stored rows are decoded into these types once,
//! right after retrieval (see [`crate::records`]); nothing downstream
//! handles raw JSON text.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Error Type
// ============================================================================

/// Error type for engine operations
#[derive(Debug, Clone)]
pub struct EngineError {
    /// Error category
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

/// Categories of errors produced by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Internal engine error (bug, unexpected state)
    Internal,
    /// A referenced route, tool, or server does not exist or is disabled
    NotFound,
    /// Caller input failed validation
    InvalidInput,
    /// Configuration error (bad fixture file, missing base URL)
    Config,
    /// The external repository failed
    Storage,
    /// Outbound tool call failed at the transport level (refused, timeout, DNS)
    ToolExecution,
}

impl EngineError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }

    /// Create an invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Config,
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Storage,
            message: message.into(),
        }
    }

    /// Create a tool execution error for the named tool
    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ToolExecution,
            message: format!("{}: {}", tool.into(), message.into()),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for EngineError {}

// ============================================================================
// Mock Routes
// ============================================================================

/// A stored fake HTTP endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockRouteDefinition {
    /// Route identity
    pub id: String,
    /// HTTP method, upper-cased
    pub method: String,
    /// Path pattern with `:name` parameters
    pub path: String,
    /// Disabled routes never match
    pub enabled: bool,
    /// Headers that must be present with these exact values (case-insensitive)
    pub match_headers: BTreeMap<String, String>,
    /// Response status code
    pub status: u16,
    /// Response headers
    pub response_headers: BTreeMap<String, String>,
    /// Response body, raw or template source
    pub body: String,
    /// Whether the body is JSON
    pub is_json: bool,
    /// Whether the body is rendered as a template
    pub templating: bool,
    /// Artificial response delay in milliseconds
    pub delay_ms: u64,
}

impl Default for MockRouteDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            method: "GET".to_owned(),
            path: "/".to_owned(),
            enabled: true,
            match_headers: BTreeMap::new(),
            status: 200,
            response_headers: BTreeMap::new(),
            body: String::new(),
            is_json: false,
            templating: false,
            delay_ms: 0,
        }
    }
}

/// A stored key/value pair scoped to one route
///
/// Keys of the form `<param>.<value>.<field>` attach a field to one concrete
/// path-parameter value; `__group__.<param>.<value>` declares an empty group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteVariable {
    /// Owning route
    pub route_id: String,
    /// Variable key
    pub key: String,
    /// Variable value
    pub value: String,
}

impl RouteVariable {
    /// Build a variable for the given route
    pub fn new(route_id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Write-only audit record for one served mock request
#[derive(Debug, Clone, Serialize)]
pub struct RequestLogEntry {
    /// Matched route, `None` when nothing matched
    pub route_id: Option<String>,
    /// Request method
    pub method: String,
    /// Normalized request path
    pub path: String,
    /// Captured path parameters
    pub params: BTreeMap<String, String>,
    /// Query parameters
    pub query: BTreeMap<String, String>,
    /// Request headers (lower-cased names)
    pub headers: BTreeMap<String, String>,
    /// Raw request body, `None` when empty
    pub body: Option<String>,
    /// Final response status
    pub status: u16,
    /// Time from receipt to response, including any artificial delay
    pub latency_ms: u64,
    /// When the entry was recorded
    pub created_at: DateTime<Utc>,
}

/// An inbound request as seen by the mock pipeline
#[derive(Debug, Clone, Default)]
pub struct MockRequest {
    /// HTTP method
    pub method: String,
    /// Request path (normalized by the pipeline)
    pub path: String,
    /// Query parameters, first value per key
    pub query: BTreeMap<String, String>,
    /// Headers keyed by lower-cased name
    pub headers: BTreeMap<String, String>,
    /// Raw request body
    pub body: String,
}

/// The response the mock pipeline wants emitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    /// Status code
    pub status: u16,
    /// Response headers, in emission order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: String,
}

impl MockResponse {
    /// Look up a response header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// Tools
// ============================================================================

/// A logical group of tools addressed by one protocol endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServer {
    /// Server identity, used in the endpoint path
    pub id: String,
    /// Display name reported by `initialize`
    pub name: String,
    /// Default base URL for this server's tools
    pub base_url: Option<String>,
    /// Disabled servers reject every call
    pub enabled: bool,
}

/// A named operation backed by an outbound HTTP call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Owning tool server
    pub server_id: String,
    /// Tool name, unique within the server
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Stored JSON input schema, if any
    pub input_schema: Option<Value>,
    /// HTTP method, upper-cased
    pub method: String,
    /// Base URL override
    pub base_url: Option<String>,
    /// Path template with `{param}` or `:param` placeholders
    pub path: String,
    /// Target query key → argument key
    pub query_mapping: BTreeMap<String, String>,
    /// Target body key → argument key
    pub body_mapping: BTreeMap<String, String>,
    /// Static headers
    pub header_mapping: BTreeMap<String, String>,
    /// Disabled tools behave as if absent
    pub enabled: bool,
}

/// Supported outbound authentication schemes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// No authentication
    #[default]
    None,
    /// API key sent as a header
    ApiKeyHeader,
    /// API key sent as a query parameter
    ApiKeyQuery,
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: Basic <base64(user:pass)>`
    Basic,
}

impl AuthType {
    /// Parse the stored scheme name; unknown names are `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Some(Self::None),
            "api_key_header" => Some(Self::ApiKeyHeader),
            "api_key_query" => Some(Self::ApiKeyQuery),
            "bearer" => Some(Self::Bearer),
            "basic" => Some(Self::Basic),
            _ => None,
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::ApiKeyHeader => write!(f, "api_key_header"),
            Self::ApiKeyQuery => write!(f, "api_key_query"),
            Self::Bearer => write!(f, "bearer"),
            Self::Basic => write!(f, "basic"),
        }
    }
}

/// Authentication settings for one tool server (at most one per server)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Selected scheme
    pub auth_type: AuthType,
    /// Header or query parameter name for API-key schemes
    pub api_key_name: Option<String>,
    /// API key value
    pub api_key_value: Option<String>,
    /// Bearer token
    pub bearer_token: Option<String>,
    /// Basic auth username
    pub basic_username: Option<String>,
    /// Basic auth password
    pub basic_password: Option<String>,
    /// Static headers layered after the primary scheme
    pub extra_headers: BTreeMap<String, String>,
}

/// Arguments supplied by a protocol caller for one `tools/call`
pub type ToolCallArguments = serde_json::Map<String, Value>;

/// Normalized result of an outbound tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    /// Upstream status code
    pub status: u16,
    /// Upstream headers, lower-cased names
    pub headers: BTreeMap<String, String>,
    /// Full response body as text
    pub raw_body: String,
    /// Parsed body when it is valid JSON
    pub json: Option<Value>,
}

impl ToolResponse {
    /// Whether the upstream answered with a 2xx status
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}
