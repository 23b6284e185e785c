// ABOUTME: Template renderer for mock response bodies with a shared compiled-template cache
// ABOUTME: Evaluates logic-less Handlebars templates against params, query, headers, body, and variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::collections::BTreeMap;

use handlebars::Handlebars;
use parking_lot::{RwLock, RwLockWriteGuard};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::types::EngineError;

/// Compiled templates kept before the cache is flushed
const MAX_CACHED_TEMPLATES: usize = 1024;

/// Renders response bodies, compiling each distinct source once
///
/// Templates are keyed by their source text, so every request for the same
/// route reuses one compiled template. The registry sits behind a read/write
/// lock: renders share the read side, compiles take the write side briefly.
/// Missing values render as empty strings and output is not HTML-escaped,
/// since bodies are usually JSON.
pub struct TemplateRenderer {
    registry: RwLock<Handlebars<'static>>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a renderer with an empty cache
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_escape_fn(handlebars::no_escape);
        Self {
            registry: RwLock::new(registry),
        }
    }

    /// Render `source` against `context`
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the source does not compile and `Internal`
    /// when evaluation fails.
    pub fn render(&self, source: &str, context: &Value) -> Result<String, EngineError> {
        {
            let registry = self.registry.read();
            if registry.has_template(source) {
                return render_cached(&registry, source, context);
            }
        }

        let mut registry = self.registry.write();
        if !registry.has_template(source) {
            if registry.get_templates().len() >= MAX_CACHED_TEMPLATES {
                debug!(cached = MAX_CACHED_TEMPLATES, "Template cache full, flushing");
                registry.clear_templates();
            }
            registry
                .register_template_string(source, source)
                .map_err(|e| EngineError::invalid_input(format!("Template does not compile: {e}")))?;
        }
        let registry = RwLockWriteGuard::downgrade(registry);
        render_cached(&registry, source, context)
    }

    /// Render, falling back to the raw source on any template error
    pub fn render_or_raw(&self, source: &str, context: &Value) -> String {
        match self.render(source, context) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(error = %e, "Template rendering failed, sending raw body");
                source.to_owned()
            }
        }
    }

    /// Number of compiled templates currently cached
    pub fn cached_templates(&self) -> usize {
        self.registry.read().get_templates().len()
    }
}

fn render_cached(
    registry: &Handlebars<'static>,
    name: &str,
    context: &Value,
) -> Result<String, EngineError> {
    registry
        .render(name, context)
        .map_err(|e| EngineError::internal(format!("Template rendering failed: {e}")))
}

/// Request-derived inputs of a template context
#[derive(Debug, Clone, Default)]
pub struct TemplateInputs<'a> {
    /// Captured path parameters
    pub params: Option<&'a BTreeMap<String, String>>,
    /// Query parameters
    pub query: Option<&'a BTreeMap<String, String>>,
    /// Lower-cased request headers
    pub headers: Option<&'a BTreeMap<String, String>>,
    /// Raw request body
    pub body: &'a str,
    /// Timestamp exposed as `now`
    pub now: String,
}

/// Assemble `{ params, query, headers, body, vars, now, ...profiles }`
///
/// `fragment` comes from [`crate::variables::ResolvedVariables::into_context_fragment`]
/// and is merged last, so profile names shadow the base keys.
pub fn build_context(inputs: &TemplateInputs<'_>, fragment: Map<String, Value>) -> Value {
    let mut context = Map::new();
    context.insert("params".to_owned(), string_map_value(inputs.params));
    context.insert("query".to_owned(), string_map_value(inputs.query));
    context.insert("headers".to_owned(), string_map_value(inputs.headers));
    context.insert("body".to_owned(), body_value(inputs.body));
    context.insert("vars".to_owned(), Value::Object(Map::new()));
    context.insert("now".to_owned(), Value::String(inputs.now.clone()));
    for (key, value) in fragment {
        context.insert(key, value);
    }
    Value::Object(context)
}

fn string_map_value(map: Option<&BTreeMap<String, String>>) -> Value {
    Value::Object(
        map.into_iter()
            .flatten()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Request body as JSON when it parses, the raw text otherwise, `null` when empty
fn body_value(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
