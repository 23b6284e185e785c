// ABOUTME: Library root for the JSON-RPC tool bridge: protocol types, dispatcher, and transports
// ABOUTME: Shared by the standalone mockdeck-mcp binary and the combined mockdeck-server router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

/// JSON-RPC envelopes, error codes, and MCP result shapes
pub mod protocol;
/// Request dispatcher
pub mod server;
/// Shared repository and executor handles
pub mod state;
/// Tool listing and invocation
pub mod tools;
/// Stdio and HTTP transports
pub mod transport;

pub use server::{McpServer, Reply};
pub use state::{ServerState, SharedState};
