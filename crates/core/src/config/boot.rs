use std::collections::HashMap;
use std::sync::OnceLock;

use crate::errors::{CoreError, CoreResult};

/// Boot configuration: the selector values the selection policies resolve
/// against, plus a one-shot key/value store for wiring-time options.
#[derive(Debug, Default)]
pub struct BootConfig {
    engine: String,
    codec: String,
    config_path: String,
    log_path: String,
    kv: OnceLock<HashMap<String, serde_json::Value>>,
}

impl BootConfig {
    pub fn new(engine: impl Into<String>, codec: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            codec: codec.into(),
            config_path: String::new(),
            log_path: String::new(),
            kv: OnceLock::new(),
        }
    }

    /// Set the configuration directory
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Set the log directory
    pub fn with_log_path(mut self, path: impl Into<String>) -> Self {
        self.log_path = path.into();
        self
    }

    /// Engine selector consumed by engine-choice managers.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Codec selector consumed by codec-choice managers.
    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    pub fn log_path(&self) -> &str {
        &self.log_path
    }

    /// Populate the key/value store. One-shot: the first call wins and later
    /// calls are ignored.
    pub fn init_kv(&self, fill: impl FnOnce(&mut HashMap<String, serde_json::Value>)) -> &Self {
        self.kv.get_or_init(|| {
            let mut values = HashMap::new();
            fill(&mut values);
            values
        });
        self
    }

    /// Fetch a value from the key/value store.
    pub fn value(&self, key: &str) -> CoreResult<&serde_json::Value> {
        let kv = self.kv.get().ok_or_else(|| {
            CoreError::configuration("boot key/value store was never initialized")
        })?;
        kv.get(key).ok_or_else(|| CoreError::key_not_found(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selectors_are_exposed() {
        let boot = BootConfig::new("axum", "serde-json")
            .with_config_path("config/")
            .with_log_path("logs/");
        assert_eq!(boot.engine(), "axum");
        assert_eq!(boot.codec(), "serde-json");
        assert_eq!(boot.config_path(), "config/");
    }

    #[test]
    fn kv_initializes_once() {
        let boot = BootConfig::new("axum", "serde-json");
        boot.init_kv(|kv| {
            kv.insert("workers".into(), json!(8));
        });
        boot.init_kv(|kv| {
            kv.insert("workers".into(), json!(99));
        });

        assert_eq!(boot.value("workers").unwrap(), &json!(8));
    }

    #[test]
    fn kv_misses_are_explicit() {
        let boot = BootConfig::new("axum", "serde-json");
        assert!(boot.value("anything").unwrap_err().is_configuration());

        boot.init_kv(|_| {});
        assert!(boot.value("anything").unwrap_err().is_not_found());
    }
}
