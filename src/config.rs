// ABOUTME: Engine configuration: outbound timeouts, user agent, and fixture file loading
// ABOUTME: Parses CLI-provided durations and reads TOML datasets into the in-memory repository
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 dravr.ai

use std::num::ParseIntError;
use std::time::Duration;

/// Default timeout for outbound tool calls (30 seconds)
const DEFAULT_OUTBOUND_TIMEOUT_SECS: u64 = 30;

/// Fixture file name looked up under the user config directory
#[cfg(feature = "config-file")]
const DEFAULT_FIXTURE_FILE: &str = "fixtures.toml";

/// Runtime settings shared by the mock pipeline and the tool executor
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound for one outbound tool call, connect through body read
    pub outbound_timeout: Duration,
    /// `User-Agent` sent on outbound tool calls
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            outbound_timeout: Duration::from_secs(DEFAULT_OUTBOUND_TIMEOUT_SECS),
            user_agent: format!("mockdeck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl EngineConfig {
    /// Set the outbound call timeout
    #[must_use]
    pub const fn with_outbound_timeout(mut self, timeout: Duration) -> Self {
        self.outbound_timeout = timeout;
        self
    }

    /// Set the outbound user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Parse a timeout value from a string (in seconds)
///
/// # Errors
///
/// Returns an error if the string cannot be parsed as a `u64`.
pub fn parse_timeout(input: &str) -> Result<Duration, ParseIntError> {
    input.trim().parse::<u64>().map(Duration::from_secs)
}

#[cfg(feature = "config-file")]
mod fixtures {
    use std::path::{Path, PathBuf};

    use tracing::{info, warn};

    use crate::records::StoredDataset;
    use crate::repository::InMemoryRepository;
    use crate::types::EngineError;

    use super::DEFAULT_FIXTURE_FILE;

    /// Default fixture location: `<config dir>/mockdeck/fixtures.toml`
    pub fn default_fixture_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mockdeck").join(DEFAULT_FIXTURE_FILE))
    }

    /// Parse a TOML dataset
    pub fn parse_dataset(source: &str) -> Result<StoredDataset, EngineError> {
        toml::from_str(source).map_err(|e| EngineError::config(format!("Invalid fixture file: {e}")))
    }

    /// Read a TOML fixture file into an in-memory repository
    pub fn load_fixtures(path: &Path) -> Result<InMemoryRepository, EngineError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            EngineError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let dataset = parse_dataset(&source)?;

        info!(
            path = %path.display(),
            routes = dataset.routes.len(),
            variables = dataset.variables.len(),
            servers = dataset.servers.len(),
            tools = dataset.tools.len(),
            "Loaded fixtures"
        );

        Ok(InMemoryRepository::from_dataset(dataset))
    }

    /// Load the explicit fixture file, else the default one if it exists
    ///
    /// With neither available the repository starts empty.
    pub fn resolve_fixtures(explicit: Option<&Path>) -> Result<InMemoryRepository, EngineError> {
        if let Some(path) = explicit {
            return load_fixtures(path);
        }
        match default_fixture_path().filter(|path| path.is_file()) {
            Some(path) => load_fixtures(&path),
            None => {
                warn!("No fixture file found, starting with an empty repository");
                Ok(InMemoryRepository::new())
            }
        }
    }
}

#[cfg(feature = "config-file")]
pub use fixtures::{default_fixture_path, load_fixtures, parse_dataset, resolve_fixtures};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_thirty_seconds() {
        let config = EngineConfig::default();
        assert_eq!(config.outbound_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("mockdeck/"));
    }

    #[test]
    fn parse_timeout_trims_input() {
        assert_eq!(parse_timeout(" 12 ").ok(), Some(Duration::from_secs(12)));
        assert!(parse_timeout("soon").is_err());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn parse_dataset_reads_stored_rows() {
        let source = r#"
            [[routes]]
            id = "ping"
            method = "get"
            path = "/ping"
            status = 200
            body = '{"ok":true}'
            is_json = true
            response_headers = '{"X-Mock":"1"}'

            [[variables]]
            route_id = "ping"
            key = "greeting"
            value = "hi"

            [[servers]]
            id = "users"
            base_url = "https://api.example.com"

            [[tools]]
            server_id = "users"
            name = "getUser"
            path = "/users/{id}"

            [[auth]]
            server_id = "users"
            auth_type = "bearer"
            bearer_token = "t0k"
        "#;
        let dataset = parse_dataset(source).expect("parse");
        assert_eq!(dataset.routes.len(), 1);
        assert!(dataset.routes[0].enabled);
        assert_eq!(dataset.tools[0].name, "getUser");
        assert!(dataset.tools[0].enabled);
        assert_eq!(dataset.auth[0].auth_type, "bearer");
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn load_fixtures_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_fixtures(&dir.path().join("missing.toml"))
            .err()
            .expect("missing file must fail");
        assert_eq!(err.kind, crate::types::ErrorKind::Config);
    }

    #[cfg(feature = "config-file")]
    #[tokio::test]
    async fn resolve_fixtures_prefers_explicit_path() {
        use crate::repository::Repository;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fixtures.toml");
        std::fs::write(
            &path,
            "[[routes]]\nid = \"a\"\nmethod = \"GET\"\npath = \"/a\"\n",
        )
        .expect("write");

        let repo = resolve_fixtures(Some(&path)).expect("load");
        let routes = repo.list_enabled_routes().await.expect("routes");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/a");
    }
}
