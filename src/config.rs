//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Server configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Environment label (development, production, ...). Only logged.
    pub env: String,
    /// Path to the SQLite database file.
    pub storage_path: PathBuf,
    /// `host:port` the HTTP listener binds to. The host may be a name.
    pub http_address: String,
    /// Deadline applied to every storage call made on behalf of a request.
    pub request_timeout: Duration,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            env: "development".to_string(),
            storage_path: PathBuf::from("./data/todo.db"),
            http_address: "127.0.0.1:8082".to_string(),
            request_timeout: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Build config from `TODO_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let env = lookup("TODO_ENV")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.env);

        let storage_path = lookup("TODO_STORAGE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_path);

        let http_address = match lookup("TODO_HTTP_ADDRESS") {
            Some(raw) => parse_address(&raw)?,
            None => defaults.http_address,
        };

        let request_timeout = parse_secs(&lookup, "TODO_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(defaults.request_timeout);
        let shutdown_timeout = parse_secs(&lookup, "TODO_SHUTDOWN_TIMEOUT_SECS")?
            .unwrap_or(defaults.shutdown_timeout);

        Ok(Self {
            env,
            storage_path,
            http_address,
            request_timeout,
            shutdown_timeout,
        })
    }
}

/// Accept `host:port` where host is an IP literal or a name. Resolution
/// happens at bind time.
fn parse_address(raw: &str) -> Result<String, ConfigError> {
    let address = raw.trim();
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "TODO_HTTP_ADDRESS".into(),
        message: format!("{raw:?}: {message}"),
    };
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port".into()))?;
    if host.is_empty() {
        return Err(invalid("missing host".into()));
    }
    port.parse::<u16>()
        .map_err(|e| invalid(format!("invalid port: {e}")))?;
    Ok(address.to_string())
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".into(),
        });
    }
    Ok(Some(Duration::from_secs(secs)))
}
