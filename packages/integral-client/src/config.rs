//! Client configuration
//!
//! Two layers, later wins:
//! - YAML file (schema v1, see [`ConfigFileV1`])
//! - Environment: `INTEGRAL_BASE_URL`, `INTEGRAL_LOG`
//!
//! ```yaml
//! version: 1
//! base_url: http://127.0.0.1:5000
//! endpoint: /calculate
//! log_filter: integral_client=debug
//! ```

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_BASE_URL: &str = "INTEGRAL_BASE_URL";
pub const ENV_LOG: &str = "INTEGRAL_LOG";

const SUPPORTED_VERSIONS: &[u32] = &[1];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    #[error("Unsupported configuration version {found}. Supported versions: {}", .supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("Invalid base URL '{0}': expected an http:// or https:// URL")]
    InvalidBaseUrl(String),

    #[error("Invalid endpoint '{0}': must start with '/'")]
    InvalidEndpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// YAML schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    pub version: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme + authority of the calculation service
    pub base_url: String,
    /// Path of the calculation endpoint
    pub endpoint: String,
    pub user_agent: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            endpoint: "/calculate".to_string(),
            user_agent: format!("integral-client/{}", env!("CARGO_PKG_VERSION")),
            log_filter: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load from a YAML file on top of the defaults
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let mut config = Self::default();
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(endpoint) = file.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(user_agent) = file.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(log_filter) = file.log_filter {
            config.log_filter = log_filter;
        }

        config.validate()
    }

    /// Apply environment overrides from the process environment
    pub fn with_env(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the process environment in
    /// production, a map in tests)
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter.trim().to_string();
        }
        self.validate()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> ConfigResult<Self> {
        self.base_url = base_url.into();
        self.validate()
    }

    fn validate(mut self) -> ConfigResult<Self> {
        let base = self.base_url.trim().trim_end_matches('/').to_string();
        match Url::parse(&base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => return Err(ConfigError::InvalidBaseUrl(self.base_url)),
        }
        if !self.endpoint.starts_with('/') {
            return Err(ConfigError::InvalidEndpoint(self.endpoint));
        }
        self.base_url = base;
        Ok(self)
    }

    /// Full URL of the calculation endpoint
    pub fn calculate_url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    /// Resolve a server-relative URL (e.g. a plot path) against the base URL
    ///
    /// Follows browser reference resolution: absolute and scheme-relative
    /// URLs keep their own host. Unresolvable input is returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        // Directory semantics, so relative paths land under the base path
        let base = Url::parse(&format!("{}/", self.base_url));
        match base.and_then(|base| base.join(path)) {
            Ok(url) => url.to_string(),
            Err(_) => path.to_string(),
        }
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            base_url: Some(self.base_url.clone()),
            endpoint: Some(self.endpoint.clone()),
            user_agent: Some(self.user_agent.clone()),
            log_filter: Some(self.log_filter.clone()),
        };
        serde_yaml::to_string(&file).map_err(ConfigError::Yaml)
    }
}
