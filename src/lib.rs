// ABOUTME: Mock route engine and tool bridge library for serving fake APIs and calling real ones
// ABOUTME: Re-exports the route matcher, template pipeline, repository, and outbound tool executor
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

//! # Mockdeck: Mock Routes and Tool Bridge
//!
//! Two engines over one repository:
//!
//! - The **mock pipeline** matches an inbound HTTP request against stored
//!   route definitions, resolves per-parameter variable groups, renders a
//!   templated body, applies an artificial delay, and logs the exchange.
//! - The **tool executor** turns a stored tool definition plus call
//!   arguments into an outbound HTTP request, layering the server's auth.
//!
//! The JSON-RPC dispatcher that exposes tools lives in `mockdeck-mcp`; the
//! HTTP surface combining both lives in `mockdeck-server`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mockdeck::{InMemoryRepository, MockEngine};
//! use mockdeck::types::{MockRequest, MockRouteDefinition};
//!
//! # async fn example() {
//! let repo = InMemoryRepository::new();
//! repo.add_route(MockRouteDefinition {
//!     id: "ping".to_owned(),
//!     method: "GET".to_owned(),
//!     path: "/ping".to_owned(),
//!     body: r#"{"ok":true}"#.to_owned(),
//!     is_json: true,
//!     ..MockRouteDefinition::default()
//! });
//!
//! let engine = MockEngine::new(Arc::new(repo));
//! let response = engine
//!     .handle(MockRequest {
//!         method: "GET".to_owned(),
//!         path: "/ping".to_owned(),
//!         ..MockRequest::default()
//!     })
//!     .await;
//! assert_eq!(response.status, 200);
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: errors, route and tool definitions, request/response shapes
//! - [`records`]: persisted record shapes and their decoding
//! - [`repository`]: storage trait and the in-memory implementation
//! - [`config`]: engine settings and fixture loading
//! - [`matcher`]: route matching and path parameter capture
//! - [`variables`]: grouped variable resolution
//! - [`template`]: cached body templating
//! - [`pipeline`]: the end-to-end mock response pipeline
//! - [`auth`]: outbound auth injection
//! - [`executor`]: outbound tool execution

/// Core types: errors, definitions, requests, and responses
pub mod types;

/// Outbound auth injection for tool calls
pub mod auth;
/// Engine settings and fixture loading
pub mod config;
/// Outbound HTTP execution of tool definitions
pub mod executor;
/// Route matching against method, path pattern, and headers
pub mod matcher;
/// Mock response pipeline
pub mod pipeline;
/// Persisted record shapes and decoding
pub mod records;
/// Storage abstraction and in-memory implementation
pub mod repository;
/// Response body templating
pub mod template;
/// Grouped variable resolution
pub mod variables;

pub use config::EngineConfig;
pub use executor::ToolExecutor;
pub use pipeline::MockEngine;
pub use repository::{InMemoryRepository, Repository, SharedRepository};
pub use template::TemplateRenderer;
pub use types::{EngineError, ErrorKind};
