// ABOUTME: Server state bundling the mock engine, the protocol dispatcher, and their repository
// ABOUTME: Built once at startup and shared immutably across request handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::sync::Arc;

use mockdeck::types::EngineError;
use mockdeck::{EngineConfig, MockEngine, SharedRepository, ToolExecutor};
use mockdeck_mcp::McpServer;

/// Shared server state handle
pub type SharedState = Arc<ServerState>;

/// Handles for both engines over one repository
pub struct ServerState {
    repository: SharedRepository,
    engine: MockEngine,
    mcp: Arc<McpServer>,
}

impl ServerState {
    /// Wire the mock engine and protocol dispatcher over `repository`
    pub fn new(repository: SharedRepository, config: &EngineConfig) -> Result<Self, EngineError> {
        let executor = ToolExecutor::new(config)?;
        let mcp_state = Arc::new(mockdeck_mcp::ServerState::new(
            Arc::clone(&repository),
            executor,
        ));
        Ok(Self {
            engine: MockEngine::new(Arc::clone(&repository)),
            mcp: Arc::new(McpServer::new(mcp_state)),
            repository,
        })
    }

    /// Repository shared by both engines
    pub fn repository(&self) -> &SharedRepository {
        &self.repository
    }

    /// Mock response pipeline
    pub const fn engine(&self) -> &MockEngine {
        &self.engine
    }

    /// Protocol dispatcher
    pub fn mcp(&self) -> Arc<McpServer> {
        Arc::clone(&self.mcp)
    }
}
