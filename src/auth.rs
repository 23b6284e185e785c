// ABOUTME: Outbound auth injection for tool calls: API keys, bearer, basic, and static headers
// ABOUTME: Pure mapping from a server's AuthConfig to the header and query additions it requires
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::types::{AuthConfig, AuthType};

/// Header and query additions produced for one outbound request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInjection {
    /// Headers to set, applied in order (later entries win on collision)
    pub headers: Vec<(String, String)>,
    /// Query pairs to add
    pub query: Vec<(String, String)>,
}

impl AuthInjection {
    /// Value of an injected header by case-insensitive name (last write wins)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Compute the auth additions for a server's config
///
/// The primary scheme is applied first, then the static extra headers, so an
/// explicit extra header overrides a scheme-generated one with the same name.
/// Schemes with missing fields contribute nothing.
pub fn inject(config: Option<&AuthConfig>) -> AuthInjection {
    let mut injection = AuthInjection::default();
    let Some(config) = config else {
        return injection;
    };

    match config.auth_type {
        AuthType::None => {}
        AuthType::ApiKeyHeader => {
            if let Some((name, value)) = api_key(config) {
                injection.headers.push((name, value));
            }
        }
        AuthType::ApiKeyQuery => {
            if let Some((name, value)) = api_key(config) {
                injection.query.push((name, value));
            }
        }
        AuthType::Bearer => {
            if let Some(token) = config.bearer_token.as_deref().filter(|t| !t.is_empty()) {
                injection
                    .headers
                    .push(("Authorization".to_owned(), format!("Bearer {token}")));
            }
        }
        AuthType::Basic => {
            if let Some(username) = config.basic_username.as_deref().filter(|u| !u.is_empty()) {
                let password = config.basic_password.as_deref().unwrap_or_default();
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                injection
                    .headers
                    .push(("Authorization".to_owned(), format!("Basic {encoded}")));
            }
        }
    }

    for (name, value) in &config.extra_headers {
        injection.headers.push((name.clone(), value.clone()));
    }

    injection
}

fn api_key(config: &AuthConfig) -> Option<(String, String)> {
    let name = config.api_key_name.as_deref().filter(|n| !n.is_empty())?;
    let value = config.api_key_value.as_deref().filter(|v| !v.is_empty())?;
    Some((name.to_owned(), value.to_owned()))
}
