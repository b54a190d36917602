//! Dispatcher configuration.
//!
//! Loaded either from JSON (any serde source) or from environment variables:
//!
//! | variable | field |
//! |---|---|
//! | `DISPATCH_HOST` | `host` (required) |
//! | `DISPATCH_TIMEOUT_MS` | `timeout_ms` |
//! | `DISPATCH_MAX_RESPONSE_BYTES` | `max_response_bytes` |

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::DispatchError;

pub const HOST_VAR: &str = "DISPATCH_HOST";
pub const TIMEOUT_VAR: &str = "DISPATCH_TIMEOUT_MS";
pub const MAX_RESPONSE_BYTES_VAR: &str = "DISPATCH_MAX_RESPONSE_BYTES";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatcherConfig {
    pub host: String,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    /// Used when a descriptor carries no timeout of its own. Zero or absent
    /// means no timeout.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Cap on a drained response body. Absent means no cap.
    #[serde(default)]
    pub max_response_bytes: Option<u64>,
}

impl DispatcherConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            default_headers: BTreeMap::new(),
            timeout_ms: None,
            max_response_bytes: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, DispatchError> {
        serde_json::from_str(raw).map_err(|e| DispatchError::Config(e.to_string()))
    }

    pub fn from_env() -> Result<Self, DispatchError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DispatchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_VAR)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DispatchError::Config(format!("{HOST_VAR} is not set")))?;
        let mut config = Self::new(host);

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            config.timeout_ms = Some(parse_number(TIMEOUT_VAR, &raw)?);
        }
        if let Some(raw) = lookup(MAX_RESPONSE_BYTES_VAR) {
            config.max_response_bytes = Some(parse_number(MAX_RESPONSE_BYTES_VAR, &raw)?);
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

fn parse_number(var: &str, raw: &str) -> Result<u64, DispatchError> {
    raw.trim()
        .parse()
        .map_err(|_| DispatchError::Config(format!("{var} must be a non-negative integer, got {raw:?}")))
}
