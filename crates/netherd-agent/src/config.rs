//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Name of the network this agent reports into
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Registry backend connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry REST API
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key; the NETHERD_API_KEY environment variable takes
    /// precedence so the key can stay out of the config file
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Hosts probed concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-ping reply timeout in seconds
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_secs: u64,
    /// Scan this subnet instead of the local interface's
    #[serde(default)]
    pub target_ip: Option<String>,
    /// Netmask for the target subnet (defaults to 255.255.255.0 when
    /// only target_ip is set)
    #[serde(default)]
    pub target_mask: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            ping_timeout_secs: default_ping_timeout(),
            target_ip: None,
            target_mask: None,
        }
    }
}

fn default_batch_size() -> usize {
    50
}

fn default_ping_timeout() -> u64 {
    1
}

impl Config {
    /// Registry credentials, required unless running with --dry-run.
    pub fn registry_credentials(&self) -> Result<(String, String)> {
        let base_url = self
            .registry
            .base_url
            .clone()
            .context("registry.base_url is not configured")?;
        let api_key = std::env::var("NETHERD_API_KEY")
            .ok()
            .or_else(|| self.registry.api_key.clone())
            .context("registry.api_key is not configured (or set NETHERD_API_KEY)")?;
        Ok((base_url, api_key))
    }

    /// Target network name, required unless running with --dry-run.
    pub fn network_name(&self) -> Result<&str> {
        self.network
            .as_deref()
            .context("network name is not configured")
    }
}

/// Load configuration from file, falling back to defaults when the
/// file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
