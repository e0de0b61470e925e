//! Endpoint configuration for `ApiClient`.
//!
//! # Design
//! `ApiConfig` is created once at process start and never mutated. Fields are
//! private so the only way to obtain one is through `new`, serde, or
//! `from_env`, and `ApiClient` validates it before any request is built.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Timeout applied when none is configured, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Environment variable holding the endpoint root.
pub const ENV_API_URL: &str = "API_URL";

/// Environment variable holding the timeout in milliseconds.
pub const ENV_API_TIMEOUT_MS: &str = "API_TIMEOUT_MS";

/// Base URL and timeout for the remote API.
///
/// Deserializes from `{ "url": "...", "timeout": 10000 }`; `timeout` is
/// optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    url: String,
    #[serde(default = "default_timeout_ms")]
    timeout: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ApiConfig {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            url: url.into(),
            timeout: timeout_ms,
        }
    }

    /// Config for `url` with the default timeout.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(url, DEFAULT_TIMEOUT_MS)
    }

    /// Read `API_URL` and, if set, `API_TIMEOUT_MS` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(ENV_API_URL).map_err(|_| ConfigError::MissingEnv(ENV_API_URL))?;
        let timeout = match std::env::var(ENV_API_TIMEOUT_MS) {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };
        let config = Self::new(url, timeout);
        config.validate()?;
        Ok(config)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Check that `url` is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.url).map_err(|source| ConfigError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidTimeout(raw.to_string()))
}
