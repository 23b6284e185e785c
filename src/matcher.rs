// ABOUTME: Route matcher selecting the first enabled mock route that fits a request
// ABOUTME: Compiles `:name` path patterns to regexes and enforces required-header constraints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::Regex;
use tracing::warn;

use crate::types::MockRouteDefinition;

/// A route paired with the path parameters it captured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The winning route
    pub route: &'a MockRouteDefinition,
    /// Captured parameter name → value
    pub params: BTreeMap<String, String>,
}

/// A compiled `:name` path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Compile a pattern such as `/users/:id/posts/:post_id`
    ///
    /// Every `:name` token becomes a single-segment capture; everything else
    /// is matched literally. Returns `None` if the generated regex is invalid.
    pub fn compile(pattern: &str) -> Option<Self> {
        let normalized = normalize_path(pattern);
        let mut source = String::from("^");
        let mut names = Vec::new();

        for (index, segment) in normalized.split('/').enumerate() {
            if index > 0 {
                source.push('/');
            }
            match segment.strip_prefix(':') {
                Some(name) if is_param_name(name) => {
                    source.push_str("([^/]+)");
                    names.push(name.to_owned());
                }
                _ => source.push_str(&regex::escape(segment)),
            }
        }
        source.push('$');

        Regex::new(&source).ok().map(|regex| Self { regex, names })
    }

    /// Parameter names in declaration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Match a normalized path, returning captured parameters
    pub fn captures(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let params = self
            .names
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                caps.get(i + 1)
                    .map(|m| (name.clone(), decode_segment(m.as_str())))
            })
            .collect();
        Some(params)
    }
}

/// Find the first route, in stored order, matching method, path, and headers
///
/// `headers` must be keyed by lower-cased header name. Returns `None` when no
/// route fits; that is an ordinary outcome, not an error.
pub fn find_route<'a>(
    routes: &'a [MockRouteDefinition],
    method: &str,
    path: &str,
    headers: &BTreeMap<String, String>,
) -> Option<RouteMatch<'a>> {
    let path = normalize_path(path);

    routes.iter().filter(|r| r.enabled).find_map(|route| {
        if !route.method.eq_ignore_ascii_case(method) {
            return None;
        }

        let Some(pattern) = PathPattern::compile(&route.path) else {
            warn!(route_id = %route.id, pattern = %route.path, "Route pattern does not compile, skipping");
            return None;
        };
        let params = pattern.captures(&path)?;

        if !headers_satisfied(&route.match_headers, headers) {
            return None;
        }

        Some(RouteMatch { route, params })
    })
}

/// Whether every required header is present with a case-insensitively equal value
pub fn headers_satisfied(
    required: &BTreeMap<String, String>,
    headers: &BTreeMap<String, String>,
) -> bool {
    required.iter().all(|(name, expected)| {
        headers
            .get(&name.to_ascii_lowercase())
            .is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
    })
}

/// Collapse repeated slashes and strip a trailing slash (except for `/`)
pub fn normalize_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        out.push('/');
    }
    for ch in path.chars() {
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Percent-decode one captured segment; invalid UTF-8 keeps the raw text
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), Cow::into_owned)
}
