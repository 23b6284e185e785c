// ABOUTME: Variable resolver deriving per-parameter profiles from a route's stored variables
// ABOUTME: Maps `<param>.<value>.<field>` keys onto the concrete path parameter bound by a request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

//! # Grouped Variables
//!
//! A route stores flat key/value pairs. Keys shaped `<param>.<value>.<field>`
//! belong to the group selected when path parameter `<param>` is bound to
//! `<value>`; the resolver lifts the matching group's fields into a profile
//! object exposed under the parameter's name. `__group__.<param>.<value>`
//! registers a group that has no fields yet.
//!
//! With variables `id.42.name = Ada` and a request to `/users/42`, templates
//! see `{{id.name}}` as `Ada`. A request to `/users/43` leaves `id` unset.
//!
//! Matching is plain prefix comparison on the raw key, so a stub for
//! `__group__.id.42` also registers the group for `id = 4`. Stored templates
//! depend on this key shape; do not tighten it.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::types::RouteVariable;

/// Prefix of keys declaring an empty group
pub const GROUP_STUB_PREFIX: &str = "__group__.";

/// Context key holding ungrouped variables
pub const VARS_KEY: &str = "vars";

/// Output of [`resolve`]: flat variables plus one profile per bound group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedVariables {
    /// Ungrouped variables, key → value
    pub vars: Map<String, Value>,
    /// Parameter name → profile object for the bound value
    pub profiles: Map<String, Value>,
}

impl ResolvedVariables {
    /// Produce the `{ vars, <param>: profile, ... }` template context fragment
    pub fn into_context_fragment(self) -> Map<String, Value> {
        let mut fragment = Map::new();
        fragment.insert(VARS_KEY.to_owned(), Value::Object(self.vars));
        for (param, profile) in self.profiles {
            fragment.insert(param, profile);
        }
        fragment
    }
}

/// Derive flat and grouped variables for one matched request
pub fn resolve(variables: &[RouteVariable], params: &BTreeMap<String, String>) -> ResolvedVariables {
    let mut resolved = ResolvedVariables::default();

    for (param, value) in params {
        let field_prefix = format!("{param}.{value}.");
        let stub_prefix = format!("{GROUP_STUB_PREFIX}{param}.{value}");
        let mut profile = Map::new();
        let mut present = false;

        for variable in variables {
            if let Some(field) = variable.key.strip_prefix(&field_prefix) {
                present = true;
                if !field.is_empty() {
                    profile.insert(field.to_owned(), Value::String(variable.value.clone()));
                }
            } else if variable.key.starts_with(&stub_prefix) {
                present = true;
            }
        }

        if present {
            resolved.profiles.insert(param.clone(), Value::Object(profile));
        }
    }

    let param_names: BTreeSet<&str> = params.keys().map(String::as_str).collect();
    for variable in variables {
        if !is_grouped(&variable.key, &param_names) {
            resolved
                .vars
                .insert(variable.key.clone(), Value::String(variable.value.clone()));
        }
    }

    resolved
}

/// A key is grouped when it is a stub or addresses a parameter of this route
fn is_grouped(key: &str, param_names: &BTreeSet<&str>) -> bool {
    if key.starts_with(GROUP_STUB_PREFIX) {
        return true;
    }
    let mut parts = key.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(param), Some(_), Some(_)) => param_names.contains(param),
        _ => false,
    }
}
