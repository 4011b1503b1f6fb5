// Wizard configuration loaded from a TOML file

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::generation::PollerConfig;

/// Configuration for a wizard client instance. Every field has a default,
/// so a missing or partial file still yields a working setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Base URL of the backend API
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Seconds between status polls during generation
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Fallback delay after a transient status-query failure
    #[serde(default = "default_poll_retry")]
    pub poll_retry_secs: u64,
    /// Optional local question catalog; when unset, questions are fetched
    /// from the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_poll_interval() -> u64 {
    3
}

fn default_poll_retry() -> u64 {
    5
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            poll_interval_secs: default_poll_interval(),
            poll_retry_secs: default_poll_retry(),
            catalog_path: None,
        }
    }
}

impl WizardConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: WizardConfig = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Polling cadence derived from this configuration
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.poll_interval_secs),
            retry_interval: Duration::from_secs(self.poll_retry_secs),
        }
    }
}
