//! Sync configuration.
//!
//! Loaded from a JSON file, then overridden by environment variables:
//!
//! ```json
//! {
//!   "endpoint": "ws://ink.example.com:3030/ws",
//!   "project_id": "classroom",
//!   "credentials": "secret",
//!   "key": "drawing",
//!   "request_timeout_secs": 10
//! }
//! ```
//!
//! Every field is optional.

use crate::transport::validate_url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:3030/ws";
pub const DEFAULT_PROJECT: &str = "default";
pub const DEFAULT_KEY: &str = "drawing";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_ENDPOINT: &str = "INKMIRROR_ENDPOINT";
pub const ENV_PROJECT_ID: &str = "INKMIRROR_PROJECT_ID";
pub const ENV_CREDENTIALS: &str = "INKMIRROR_CREDENTIALS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Where and how to reach the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// WebSocket URL of the relay server.
    pub endpoint: String,
    /// Namespace for records on the server.
    pub project_id: String,
    /// Presented on connect; the server may require it for writes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    /// Record holding the shared drawing.
    pub key: String,
    #[serde(rename = "request_timeout_secs", with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: DEFAULT_PROJECT.to_string(),
            credentials: None,
            key: DEFAULT_KEY.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

impl SyncConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Default config file location: `<config dir>/inkmirror/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("inkmirror").join("config.json"))
    }

    /// Read `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json_str(&json)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load) on the default path, falling back to the
    /// built-in defaults when no file exists there.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path().filter(|p| p.exists()) {
            log::info!("Loading config from {}", path.display());
            return Self::load(&path);
        }
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(project_id) = lookup(ENV_PROJECT_ID) {
            self.project_id = project_id;
        }
        if let Some(credentials) = lookup(ENV_CREDENTIALS) {
            self.credentials = Some(credentials).filter(|c| !c.is_empty());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        validate_url(&self.endpoint)
            .map(|_| ())
            .map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.endpoint, "ws://localhost:3030/ws");
        assert_eq!(config.project_id, "default");
        assert_eq!(config.key, "drawing");
        assert_eq!(config.credentials, None);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SyncConfig::from_json_str(r#"{"project_id":"classroom","request_timeout_secs":3}"#).unwrap();
        assert_eq!(config.project_id, "classroom");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"endpoint":"ws://ink.example.com:3030/ws","credentials":"secret"}}"#
        )
        .unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.endpoint, "ws://ink.example.com:3030/ws");
        assert_eq!(config.credentials.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SyncConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_rejects_http_endpoint() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"endpoint":"http://example.com"}}"#).unwrap();
        assert!(matches!(
            SyncConfig::load(file.path()),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_load_rejects_zero_timeout_and_tls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"request_timeout_secs":0}}"#).unwrap();
        assert!(matches!(SyncConfig::load(file.path()), Err(ConfigError::ZeroTimeout)));

        let config = SyncConfig {
            endpoint: "wss://ink.example.com/ws".to_string(),
            ..SyncConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SyncConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "ws://relay:4000/ws"),
            (ENV_PROJECT_ID, "lab"),
            (ENV_CREDENTIALS, ""),
        ]
        .into_iter()
        .collect();

        let mut config = SyncConfig {
            credentials: Some("old".to_string()),
            ..SyncConfig::default()
        };
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.endpoint, "ws://relay:4000/ws");
        assert_eq!(config.project_id, "lab");
        assert_eq!(config.credentials, None);
    }
}
