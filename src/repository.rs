// ABOUTME: Repository interface consumed by the engine plus an in-memory implementation
// ABOUTME: Supplies route/tool/auth snapshots and receives append-only request log entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::records::StoredDataset;
use crate::types::{
    AuthConfig, EngineError, MockRouteDefinition, RequestLogEntry, RouteVariable, ToolDefinition,
    ToolServer,
};

/// Shared repository handle
pub type SharedRepository = Arc<dyn Repository>;

/// Persistence owned by the dashboard, borrowed read-only by the engine
///
/// The engine only reads definitions and appends log entries. Implementations
/// return typed definitions; decoding of stored JSON text belongs on their side
/// (see [`crate::records`]).
#[async_trait]
pub trait Repository: Send + Sync {
    /// All enabled mock routes, in stored order
    async fn list_enabled_routes(&self) -> Result<Vec<MockRouteDefinition>, EngineError>;

    /// Variables belonging to one route
    async fn list_variables(&self, route_id: &str) -> Result<Vec<RouteVariable>, EngineError>;

    /// Append one request log entry
    async fn append_log(&self, entry: RequestLogEntry) -> Result<(), EngineError>;

    /// Look up a tool server by id
    async fn get_tool_server(&self, server_id: &str) -> Result<Option<ToolServer>, EngineError>;

    /// Enabled tools of one server, in stored order
    async fn list_enabled_tools(&self, server_id: &str) -> Result<Vec<ToolDefinition>, EngineError>;

    /// Look up a tool by name within one server, regardless of its enabled flag
    async fn get_tool_by_name(
        &self,
        server_id: &str,
        name: &str,
    ) -> Result<Option<ToolDefinition>, EngineError>;

    /// The auth config of one server, if any
    async fn get_auth_config(&self, server_id: &str) -> Result<Option<AuthConfig>, EngineError>;
}

/// Repository backed by process memory
///
/// Used for fixture-driven local runs and in tests. Definitions can be
/// replaced at runtime; logs only grow.
#[derive(Default)]
pub struct InMemoryRepository {
    routes: RwLock<Vec<MockRouteDefinition>>,
    variables: RwLock<Vec<RouteVariable>>,
    servers: RwLock<Vec<ToolServer>>,
    tools: RwLock<Vec<ToolDefinition>>,
    auth: RwLock<HashMap<String, AuthConfig>>,
    logs: RwLock<Vec<RequestLogEntry>>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from decoded stored rows
    pub fn from_dataset(dataset: StoredDataset) -> Self {
        let repo = Self::new();
        for route in dataset.routes {
            repo.add_route(route.into_definition());
        }
        for variable in dataset.variables {
            repo.add_variable(variable.into_variable());
        }
        for server in dataset.servers {
            repo.add_server(server.into_server());
        }
        for tool in dataset.tools {
            repo.add_tool(tool.into_definition());
        }
        for auth in dataset.auth {
            let server_id = auth.server_id.clone();
            repo.set_auth(server_id, auth.into_config());
        }
        repo
    }

    /// Append a route; stored order is insertion order
    pub fn add_route(&self, route: MockRouteDefinition) {
        self.routes.write().push(route);
    }

    /// Add or replace a variable, keeping `(route_id, key)` unique
    pub fn add_variable(&self, variable: RouteVariable) {
        let mut variables = self.variables.write();
        if let Some(existing) = variables
            .iter_mut()
            .find(|v| v.route_id == variable.route_id && v.key == variable.key)
        {
            existing.value = variable.value;
        } else {
            variables.push(variable);
        }
    }

    /// Add a tool server
    pub fn add_server(&self, server: ToolServer) {
        self.servers.write().push(server);
    }

    /// Add a tool
    pub fn add_tool(&self, tool: ToolDefinition) {
        self.tools.write().push(tool);
    }

    /// Set the auth config of a server, replacing any previous one
    pub fn set_auth(&self, server_id: impl Into<String>, auth: AuthConfig) {
        self.auth.write().insert(server_id.into(), auth);
    }

    /// Snapshot of every log entry written so far
    pub fn logs(&self) -> Vec<RequestLogEntry> {
        self.logs.read().clone()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_enabled_routes(&self) -> Result<Vec<MockRouteDefinition>, EngineError> {
        Ok(self
            .routes
            .read()
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .collect())
    }

    async fn list_variables(&self, route_id: &str) -> Result<Vec<RouteVariable>, EngineError> {
        Ok(self
            .variables
            .read()
            .iter()
            .filter(|v| v.route_id == route_id)
            .cloned()
            .collect())
    }

    async fn append_log(&self, entry: RequestLogEntry) -> Result<(), EngineError> {
        self.logs.write().push(entry);
        Ok(())
    }

    async fn get_tool_server(&self, server_id: &str) -> Result<Option<ToolServer>, EngineError> {
        Ok(self
            .servers
            .read()
            .iter()
            .find(|s| s.id == server_id)
            .cloned())
    }

    async fn list_enabled_tools(&self, server_id: &str) -> Result<Vec<ToolDefinition>, EngineError> {
        Ok(self
            .tools
            .read()
            .iter()
            .filter(|t| t.server_id == server_id && t.enabled)
            .cloned()
            .collect())
    }

    async fn get_tool_by_name(
        &self,
        server_id: &str,
        name: &str,
    ) -> Result<Option<ToolDefinition>, EngineError> {
        Ok(self
            .tools
            .read()
            .iter()
            .find(|t| t.server_id == server_id && t.name == name)
            .cloned())
    }

    async fn get_auth_config(&self, server_id: &str) -> Result<Option<AuthConfig>, EngineError> {
        Ok(self.auth.read().get(server_id).cloned())
    }
}
