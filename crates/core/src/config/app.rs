use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_KEEPALIVE_SECS;
use crate::errors::CoreResult;

/// Application configuration loaded at bootstrap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub keepalive: KeepaliveConfig,
}

impl AppConfig {
    /// Parse from a YAML document.
    pub fn from_yaml_str(source: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }
}

/// Settings for the background global-object keepalive supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// The supervisor is only started when this is set.
    pub enabled: bool,
    /// Sweep interval in seconds.
    pub interval_secs: u64,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: DEFAULT_KEEPALIVE_SECS,
        }
    }
}
