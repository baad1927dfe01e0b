use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::config::{AppConfig, BootConfig};
use crate::container::GlobalStore;
use crate::registry::{DefaultLocations, DefaultTypes, LocationRegistry, TypeRegistry};

/// Application context threaded through wiring and provider initialization.
///
/// Owns the two registries (with their default sets pre-registered), the
/// configuration, the global object store, and a general keyed storage.
/// Created once at process entry and passed by handle; everything on it is
/// append-only or one-shot after startup.
pub struct AppContext {
    config: AppConfig,
    types: TypeRegistry,
    locations: LocationRegistry,
    default_types: DefaultTypes,
    default_locations: DefaultLocations,
    store: Arc<GlobalStore>,
    storage: Storage,
    boot: OnceLock<BootConfig>,
    started: OnceLock<bool>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let types = TypeRegistry::new();
        let locations = LocationRegistry::new();
        let default_types = DefaultTypes::register(&types);
        let default_locations = DefaultLocations::register(&locations);
        Arc::new(Self {
            config,
            types,
            locations,
            default_types,
            default_locations,
            store: Arc::new(GlobalStore::new()),
            storage: Storage::new(),
            boot: OnceLock::new(),
            started: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Type registry; the reserved range already holds the default set.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Location registry; the reserved range already holds the default set.
    pub fn locations(&self) -> &LocationRegistry {
        &self.locations
    }

    pub fn default_types(&self) -> &DefaultTypes {
        &self.default_types
    }

    pub fn default_locations(&self) -> &DefaultLocations {
        &self.default_locations
    }

    /// Global object store providers publish constructed singletons into.
    pub fn store(&self) -> &Arc<GlobalStore> {
        &self.store
    }

    /// General keyed storage on the context.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Register the boot configuration. One-shot: the first call wins.
    pub fn register_boot_config(&self, boot: BootConfig) {
        let _ = self.boot.set(boot);
    }

    pub fn boot_config(&self) -> Option<&BootConfig> {
        self.boot.get()
    }

    /// Mark the application as started. One-shot.
    pub fn register_started(&self) {
        let _ = self.started.set(true);
    }

    pub fn is_started(&self) -> bool {
        self.started.get().copied().unwrap_or(false)
    }
}

/// Keyed storage of shared `Any` values, usable from any wiring code that
/// needs to stash something on the context.
pub struct Storage {
    data: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl Storage {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        if let Ok(mut data) = self.data.write() {
            data.insert(key.into(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.data.read().ok().and_then(|data| data.get(key).cloned())
    }

    pub fn get_or(
        &self,
        key: &str,
        default: Arc<dyn Any + Send + Sync>,
    ) -> Arc<dyn Any + Send + Sync> {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.data
            .read()
            .map(|data| data.contains_key(key))
            .unwrap_or(false)
    }

    /// Remove a key, reporting whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        self.data
            .write()
            .map(|mut data| data.remove(key).is_some())
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        if let Ok(mut data) = self.data.write() {
            data.clear();
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.data
            .read()
            .map(|data| data.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate entries, stopping when `f` returns false.
    pub fn range(&self, mut f: impl FnMut(&str, &Arc<dyn Any + Send + Sync>) -> bool) {
        if let Ok(data) = self.data.read() {
            for (key, value) in data.iter() {
                if !f(key, value) {
                    break;
                }
            }
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_config_is_one_shot() {
        let ctx = AppContext::new(AppConfig::default());
        assert!(ctx.boot_config().is_none());

        ctx.register_boot_config(BootConfig::new("axum", "serde-json"));
        ctx.register_boot_config(BootConfig::new("actix", "simd-json"));

        // the first registration wins
        assert_eq!(ctx.boot_config().unwrap().engine(), "axum");
    }

    #[test]
    fn started_flag_is_one_shot() {
        let ctx = AppContext::new(AppConfig::default());
        assert!(!ctx.is_started());
        ctx.register_started();
        assert!(ctx.is_started());
    }

    #[test]
    fn context_registries_come_preloaded_with_defaults() {
        let ctx = AppContext::new(AppConfig::default());
        assert!(ctx.types().lookup("EngineChoose").is_ok());
        assert!(ctx.locations().lookup("EngineCreate").is_ok());
        assert!(ctx.default_types().zero.is_zero());
    }

    #[test]
    fn storage_round_trip() {
        let storage = Storage::new();
        storage.set("answer", Arc::new(42_u32));

        let value = storage.get("answer").unwrap();
        assert_eq!(*value.downcast::<u32>().unwrap(), 42);
        assert!(storage.has("answer"));
        assert_eq!(storage.len(), 1);

        assert!(storage.delete("answer"));
        assert!(!storage.delete("answer"));
        assert!(storage.is_empty());
    }

    #[test]
    fn storage_range_stops_early() {
        let storage = Storage::new();
        for i in 0..5 {
            storage.set(format!("k{i}"), Arc::new(i));
        }

        let mut visited = 0;
        storage.range(|_, _| {
            visited += 1;
            visited < 2
        });
        assert_eq!(visited, 2);
    }
}
