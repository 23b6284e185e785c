// ABOUTME: Shared dispatcher state holding the repository handle and the outbound tool executor
// ABOUTME: Immutable after startup; every request reads tool servers and tools through the repository
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::sync::Arc;

use mockdeck::{SharedRepository, ToolExecutor};

/// Type alias for the shared state handle used across the server
pub type SharedState = Arc<ServerState>;

/// Central dispatcher state
///
/// Holds no per-request data: tool servers, tools, and auth configs are read
/// from the repository on every call, so fixture or database changes are
/// visible without a restart.
pub struct ServerState {
    repository: SharedRepository,
    executor: ToolExecutor,
}

impl ServerState {
    /// Create state over a repository and executor
    pub const fn new(repository: SharedRepository, executor: ToolExecutor) -> Self {
        Self {
            repository,
            executor,
        }
    }

    /// Repository holding tool servers, tools, and auth configs
    pub fn repository(&self) -> &SharedRepository {
        &self.repository
    }

    /// Executor used for `tools/call`
    pub const fn executor(&self) -> &ToolExecutor {
        &self.executor
    }
}
