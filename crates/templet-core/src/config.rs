//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.templet/config.yaml, or an explicit `--config` file)
//! 3. Environment variables (TEMPLET_* prefix)
//! 4. CLI flags (handled by caller)
//!
//! The user file is merged over the defaults key by key, so it only needs the keys it changes.

use crate::error::{Error, Result};
use crate::utils::templet_dir;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::fs;
use std::time::Duration;
use tracing::debug;

const EMBEDDED_DEFAULTS: &str = include_str!("../config/defaults.yaml");

/// Environment variable overriding the proxy origin
pub const ENV_PROXY_ORIGIN: &str = "TEMPLET_PROXY_ORIGIN";
/// Environment variable disabling the proxy (`1`, `true`, `yes`)
pub const ENV_NO_PROXY: &str = "TEMPLET_NO_PROXY";
/// Environment variable adding a registry mirror in front of the configured ones
pub const ENV_REGISTRY_URL: &str = "TEMPLET_REGISTRY_URL";
/// Environment variable overriding the package registry used by the install step
pub const ENV_NPM_REGISTRY: &str = "TEMPLET_NPM_REGISTRY";

/// Resolved templet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TempletConfig {
    pub proxy: ProxyConfig,
    pub fetch: FetchConfig,
    pub registry: RegistryConfig,
    pub install: InstallConfig,
    pub update: UpdateConfig,
}

/// Accelerating proxy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyConfig {
    pub enabled: bool,
    /// Prefix prepended to the source URL, e.g. `https://ghproxy.com/`
    pub origin: String,
    /// Host fragments that are fetched directly
    pub direct_hosts: Vec<String>,
}

/// Repository fetch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Clone with `--depth 1` when a checkout ref is given
    pub shallow: bool,
    /// Simulated progress tick interval
    pub tick_interval_ms: u64,
    /// Render the progress line
    pub progress: bool,
}

impl FetchConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Template registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryConfig {
    /// Mirrors tried in order
    pub sources: Vec<RegistrySource>,
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
}

/// One template list mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySource {
    pub label: String,
    pub url: String,
}

/// Dependency install after `create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstallConfig {
    pub enabled: bool,
    /// `npm`, `pnpm`, `yarn`...
    pub package_manager: String,
    /// Passed as `--registry`; empty keeps the package manager's own
    pub registry: String,
    /// Simulated progress tick interval
    pub tick_interval_ms: u64,
}

impl InstallConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Release lookup for `templet update`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateConfig {
    pub api_url: String,
    /// `owner/name` on GitHub
    pub repository: String,
    pub timeout_secs: u64,
}

impl TempletConfig {
    /// The built-in defaults
    pub fn embedded() -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(EMBEDDED_DEFAULTS).map_err(|e| {
            Error::invalid_config(format!("Failed to parse embedded defaults: {}", e))
        })?;
        Ok(config)
    }
}

/// Configuration hierarchy loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for config and cache files
    config_dir: Utf8PathBuf,
    /// Explicit config file replacing `<config_dir>/config.yaml`
    config_file: Option<Utf8PathBuf>,
}

impl ConfigLoader {
    /// Create a loader rooted at `~/.templet`
    pub fn new() -> Result<Self> {
        Ok(Self::with_dir(templet_dir()?))
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            config_file: None,
        }
    }

    /// Use an explicit config file instead of `config.yaml` in the config directory
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Directory for cached downloads (template list)
    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.config_dir.join("cache")
    }

    /// Load configuration with hierarchical precedence, reading the process environment
    pub fn load(&self) -> Result<TempletConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Load configuration with an explicit environment lookup
    pub fn load_with_env<F>(&self, env: F) -> Result<TempletConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged: Value = serde_yaml_ng::from_str(EMBEDDED_DEFAULTS)?;

        if let Some(overlay) = self.read_user_file()? {
            merge_values(&mut merged, overlay);
        }

        let config: TempletConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("Invalid configuration: {}", e)))?;

        Ok(apply_env_overrides(config, env))
    }

    fn read_user_file(&self) -> Result<Option<Value>> {
        let (path, required) = match &self.config_file {
            Some(path) => (path.clone(), true),
            None => (self.config_dir.join("config.yaml"), false),
        };

        if !path.exists() {
            if required {
                return Err(Error::config_not_found(path.as_str()));
            }
            return Ok(None);
        }

        debug!("Loading config from {}", path);
        let content = fs::read_to_string(&path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;

        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(value))
    }
}

/// Merge `overlay` into `base`; mappings merge per key, anything else replaces
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overlay) => *base = overlay,
    }
}

fn apply_env_overrides<F>(mut config: TempletConfig, env: F) -> TempletConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(origin) = env(ENV_PROXY_ORIGIN).filter(|v| !v.trim().is_empty()) {
        let origin = origin.trim();
        config.proxy.origin = if origin.ends_with('/') {
            origin.to_string()
        } else {
            format!("{}/", origin)
        };
    }

    if let Some(flag) = env(ENV_NO_PROXY) {
        if matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes") {
            config.proxy.enabled = false;
        }
    }

    if let Some(registry) = env(ENV_NPM_REGISTRY) {
        config.install.registry = registry.trim().to_string();
    }

    if let Some(url) = env(ENV_REGISTRY_URL).filter(|v| !v.trim().is_empty()) {
        config.registry.sources.insert(
            0,
            RegistrySource {
                label: "env".to_string(),
                url: url.trim().to_string(),
            },
        );
    }

    config
}
