// ABOUTME: Mock response pipeline: match, resolve variables, render, delay, emit, and log
// ABOUTME: Serves everyday fake-API traffic from stored route definitions with one audit entry per request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::matcher::{find_route, normalize_path};
use crate::repository::SharedRepository;
use crate::template::{build_context, TemplateInputs, TemplateRenderer};
use crate::types::{MockRequest, MockResponse, MockRouteDefinition, RequestLogEntry};
use crate::variables;

/// Content type for JSON routes without an explicit one
const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type for non-JSON routes without an explicit one
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Serves mock traffic against the repository's enabled routes
///
/// Each call runs MATCH → RESOLVE_VARS → RENDER → EMIT → LOG and is
/// independent of every other call; the only shared mutable state is the
/// renderer's template cache. The artificial delay is an async sleep inside
/// the request's own future, so dropping the future (client gone) abandons
/// the request before anything is logged.
#[derive(Clone)]
pub struct MockEngine {
    repository: SharedRepository,
    renderer: Arc<TemplateRenderer>,
}

impl MockEngine {
    /// Create an engine over the given repository
    pub fn new(repository: SharedRepository) -> Self {
        Self {
            repository,
            renderer: Arc::new(TemplateRenderer::new()),
        }
    }

    /// The shared template renderer
    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Serve one request and record exactly one log entry for it
    pub async fn handle(&self, request: MockRequest) -> MockResponse {
        let started = Instant::now();
        let path = normalize_path(&request.path);

        let routes = match self.repository.list_enabled_routes().await {
            Ok(routes) => routes,
            Err(e) => {
                error!(error = %e, "Failed to list mock routes");
                let response = json_response(
                    500,
                    &json!({"error": "Mock routes unavailable", "message": e.message}),
                );
                self.record(&request, &path, None, BTreeMap::new(), response.status, started)
                    .await;
                return response;
            }
        };

        let Some(matched) = find_route(&routes, &request.method, &path, &request.headers) else {
            debug!(method = %request.method, path = %path, "No mock route matched");
            let response = json_response(
                404,
                &json!({
                    "error": "No mock route matched",
                    "method": request.method,
                    "path": path,
                }),
            );
            self.record(&request, &path, None, BTreeMap::new(), response.status, started)
                .await;
            return response;
        };

        let route = matched.route;
        let params = matched.params;
        debug!(route_id = %route.id, method = %request.method, path = %path, "Mock route matched");

        let body = if route.templating {
            self.render_body(route, &request, &params).await
        } else {
            route.body.clone()
        };
        let response = build_response(route, body);

        if route.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(route.delay_ms)).await;
        }

        self.record(
            &request,
            &path,
            Some(route.id.clone()),
            params,
            response.status,
            started,
        )
        .await;
        response
    }

    async fn render_body(
        &self,
        route: &MockRouteDefinition,
        request: &MockRequest,
        params: &BTreeMap<String, String>,
    ) -> String {
        let stored = match self.repository.list_variables(&route.id).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(route_id = %route.id, error = %e, "Failed to load route variables, rendering without them");
                Vec::new()
            }
        };
        let fragment = variables::resolve(&stored, params).into_context_fragment();
        let inputs = TemplateInputs {
            params: Some(params),
            query: Some(&request.query),
            headers: Some(&request.headers),
            body: &request.body,
            now: Utc::now().to_rfc3339(),
        };
        let context = build_context(&inputs, fragment);
        self.renderer.render_or_raw(&route.body, &context)
    }

    async fn record(
        &self,
        request: &MockRequest,
        path: &str,
        route_id: Option<String>,
        params: BTreeMap<String, String>,
        status: u16,
        started: Instant,
    ) {
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let entry = RequestLogEntry {
            route_id,
            method: request.method.clone(),
            path: path.to_owned(),
            params,
            query: request.query.clone(),
            headers: request.headers.clone(),
            body: Some(request.body.clone()).filter(|b| !b.is_empty()),
            status,
            latency_ms,
            created_at: Utc::now(),
        };

        debug!(
            route_id = ?entry.route_id,
            method = %entry.method,
            path = %entry.path,
            status,
            latency_ms,
            "Mock request served"
        );

        if let Err(e) = self.repository.append_log(entry).await {
            warn!(error = %e, "Failed to write request log entry");
        }
    }
}

/// Turn a route and its rendered body into the response to emit
///
/// The rendered text is always sent as written. For JSON routes the text is
/// parsed only to check it; a body that does not parse is still sent, with
/// the declared (or default) content type.
pub fn build_response(route: &MockRouteDefinition, body: String) -> MockResponse {
    let mut headers: Vec<(String, String)> = route
        .response_headers
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let has_content_type = headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("content-type"));
    if !has_content_type {
        let content_type = if route.is_json {
            JSON_CONTENT_TYPE
        } else {
            TEXT_CONTENT_TYPE
        };
        headers.push(("content-type".to_owned(), content_type.to_owned()));
    }

    if route.is_json {
        if let Err(e) = serde_json::from_str::<serde::de::IgnoredAny>(&body) {
            debug!(route_id = %route.id, error = %e, "JSON route body does not parse, sending raw text");
        }
    }

    MockResponse {
        status: route.status,
        headers,
        body,
    }
}

fn json_response(status: u16, body: &Value) -> MockResponse {
    MockResponse {
        status,
        headers: vec![("content-type".to_owned(), JSON_CONTENT_TYPE.to_owned())],
        body: body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryRepository, Repository};
    use crate::types::{EngineError, RouteVariable, ToolDefinition, ToolServer};
    use async_trait::async_trait;

    fn route(id: &str, method: &str, path: &str, body: &str) -> MockRouteDefinition {
        MockRouteDefinition {
            id: id.to_owned(),
            method: method.to_owned(),
            path: path.to_owned(),
            enabled: true,
            match_headers: BTreeMap::new(),
            status: 200,
            response_headers: BTreeMap::new(),
            body: body.to_owned(),
            is_json: true,
            templating: false,
            delay_ms: 0,
        }
    }

    fn get(path: &str) -> MockRequest {
        MockRequest {
            method: "GET".to_owned(),
            path: path.to_owned(),
            ..MockRequest::default()
        }
    }

    fn engine_with(routes: Vec<MockRouteDefinition>) -> (MockEngine, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        for r in routes {
            repo.add_route(r);
        }
        let shared: SharedRepository = repo.clone();
        (MockEngine::new(shared), repo)
    }

    #[tokio::test]
    async fn ping_route_returns_body_and_logs_once() {
        let (engine, repo) = engine_with(vec![route("ping", "GET", "/ping", r#"{"ok":true}"#)]);

        let response = engine.handle(get("/ping")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"ok":true}"#);
        assert_eq!(response.header("content-type"), Some("application/json"));

        let logs = repo.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, 200);
        assert_eq!(logs[0].route_id.as_deref(), Some("ping"));
    }

    #[tokio::test]
    async fn unmatched_request_is_404_and_logged_without_route() {
        let (engine, repo) = engine_with(vec![route("ping", "GET", "/ping", "{}")]);

        let response = engine.handle(get("/nothing/here")).await;
        assert_eq!(response.status, 404);
        let body: Value = serde_json::from_str(&response.body).expect("json");
        assert_eq!(body["path"], "/nothing/here");

        let logs = repo.logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].route_id.is_none());
        assert_eq!(logs[0].status, 404);
    }

    #[tokio::test]
    async fn templated_route_uses_grouped_variables() {
        let mut user = route("user", "GET", "/users/:id", r#"{"id":"{{params.id}}","name":"{{id.name}}","v":"{{vars.version}}"}"#);
        user.templating = true;
        let (engine, repo) = engine_with(vec![user]);
        repo.add_variable(RouteVariable::new("user", "id.42.name", "Ada"));
        repo.add_variable(RouteVariable::new("user", "version", "2"));

        let known = engine.handle(get("/users/42")).await;
        let body: Value = serde_json::from_str(&known.body).expect("json");
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["v"], "2");

        let unknown = engine.handle(get("/users/43")).await;
        let body: Value = serde_json::from_str(&unknown.body).expect("json");
        assert_eq!(body["id"], "43");
        assert_eq!(body["name"], "");
    }

    #[tokio::test]
    async fn templating_disabled_returns_raw_body() {
        let mut raw = route("raw", "GET", "/raw", "{{params.id}} stays");
        raw.is_json = false;
        let (engine, _repo) = engine_with(vec![raw]);

        let response = engine.handle(get("/raw")).await;
        assert_eq!(response.body, "{{params.id}} stays");
        assert_eq!(response.header("content-type"), Some(TEXT_CONTENT_TYPE));
    }

    #[tokio::test]
    async fn invalid_json_body_falls_back_to_raw_text() {
        let (engine, repo) = engine_with(vec![route("bad", "GET", "/bad", "{not json")]);

        let response = engine.handle(get("/bad")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{not json");
        assert_eq!(response.header("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(repo.logs().len(), 1);
    }

    #[tokio::test]
    async fn json_body_is_sent_as_written() {
        let (engine, _repo) = engine_with(vec![
            route("order", "GET", "/order", r#"{"z":1,"a":2}"#),
            route("big", "GET", "/big", r#"{ "id": 12345678901234567890123 }"#),
        ]);

        let response = engine.handle(get("/order")).await;
        assert_eq!(response.body, r#"{"z":1,"a":2}"#);
        assert_eq!(response.header("content-type"), Some(JSON_CONTENT_TYPE));

        let response = engine.handle(get("/big")).await;
        assert_eq!(response.body, r#"{ "id": 12345678901234567890123 }"#);
    }

    #[tokio::test]
    async fn response_headers_and_status_are_applied() {
        let mut created = route("c", "POST", "/items", r#"{"id":1}"#);
        created.status = 201;
        created
            .response_headers
            .insert("Content-Type".to_owned(), "application/vnd.api+json".to_owned());
        created
            .response_headers
            .insert("X-Mock".to_owned(), "yes".to_owned());
        let (engine, _repo) = engine_with(vec![created]);

        let response = engine
            .handle(MockRequest {
                method: "POST".to_owned(),
                path: "/items".to_owned(),
                body: r#"{"name":"x"}"#.to_owned(),
                ..MockRequest::default()
            })
            .await;
        assert_eq!(response.status, 201);
        assert_eq!(response.header("content-type"), Some("application/vnd.api+json"));
        assert_eq!(response.header("x-mock"), Some("yes"));
        assert_eq!(response.headers.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_is_applied_before_logging() {
        let mut slow = route("slow", "GET", "/slow", "{}");
        slow.delay_ms = 1_500;
        let (engine, repo) = engine_with(vec![slow]);

        let started = tokio::time::Instant::now();
        let response = engine.handle(get("/slow")).await;
        assert_eq!(response.status, 200);
        assert!(started.elapsed() >= Duration::from_millis(1_500));
        assert_eq!(repo.logs().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_delay_writes_no_log() {
        let mut slow = route("slow", "GET", "/slow", "{}");
        slow.delay_ms = 10_000;
        let (engine, repo) = engine_with(vec![slow]);

        let outcome =
            tokio::time::timeout(Duration::from_millis(100), engine.handle(get("/slow"))).await;
        assert!(outcome.is_err());
        assert!(repo.logs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_suspends_only_its_own_request() {
        let mut slow = route("slow", "GET", "/slow", "{}");
        slow.delay_ms = 10_000;
        let (engine, repo) = engine_with(vec![slow, route("fast", "GET", "/fast", "{}")]);

        let started = tokio::time::Instant::now();
        let slow_engine = engine.clone();
        let slow_task = tokio::spawn(async move { slow_engine.handle(get("/slow")).await });
        tokio::task::yield_now().await;

        let fast = engine.handle(get("/fast")).await;
        assert_eq!(fast.status, 200);
        assert!(started.elapsed() < Duration::from_millis(10_000));
        let logs = repo.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].route_id.as_deref(), Some("fast"));

        let slow = slow_task.await.expect("slow request task");
        assert_eq!(slow.status, 200);
        assert!(started.elapsed() >= Duration::from_millis(10_000));
        assert_eq!(repo.logs().len(), 2);
    }

    struct FailingRepository;

    #[async_trait]
    impl Repository for FailingRepository {
        async fn list_enabled_routes(&self) -> Result<Vec<MockRouteDefinition>, EngineError> {
            Ok(vec![route("ping", "GET", "/ping", r#"{"ok":true}"#)])
        }
        async fn list_variables(&self, _route_id: &str) -> Result<Vec<RouteVariable>, EngineError> {
            Err(EngineError::storage("variables offline"))
        }
        async fn append_log(&self, _entry: RequestLogEntry) -> Result<(), EngineError> {
            Err(EngineError::storage("log table locked"))
        }
        async fn get_tool_server(&self, _id: &str) -> Result<Option<ToolServer>, EngineError> {
            Ok(None)
        }
        async fn list_enabled_tools(&self, _id: &str) -> Result<Vec<ToolDefinition>, EngineError> {
            Ok(Vec::new())
        }
        async fn get_tool_by_name(
            &self,
            _id: &str,
            _name: &str,
        ) -> Result<Option<ToolDefinition>, EngineError> {
            Ok(None)
        }
        async fn get_auth_config(
            &self,
            _id: &str,
        ) -> Result<Option<crate::types::AuthConfig>, EngineError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn log_failure_does_not_mask_response() {
        let engine = MockEngine::new(Arc::new(FailingRepository));
        let response = engine.handle(get("/ping")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"ok":true}"#);
    }
}
