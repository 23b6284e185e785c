// ABOUTME: Transport abstraction for the tool bridge's JSON-RPC channels
// ABOUTME: Defines the McpTransport trait implemented by stdio and HTTP backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

pub mod http;
pub mod stdio;

use std::sync::Arc;

use async_trait::async_trait;
use mockdeck::types::EngineError;

use crate::server::McpServer;

/// Transport layer for JSON-RPC message exchange
///
/// Implementations handle the mechanics of reading requests and writing
/// responses over a specific channel (stdio, HTTP).
#[async_trait]
pub trait McpTransport: Send {
    /// Start serving requests, returning when the transport shuts down
    async fn serve(self, server: Arc<McpServer>) -> Result<(), EngineError>;
}
