use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::{CoreError, CoreResult};

/// Shared handle to a stored global object.
pub type GlobalValue = Arc<dyn Any + Send + Sync>;

/// Constructor for a global object.
pub type GlobalFactory = Arc<dyn Fn() -> CoreResult<GlobalValue> + Send + Sync>;

/// Per-entry health predicate, given the current cached value.
pub type GlobalHealthCheck = Arc<dyn Fn(&GlobalValue) -> CoreResult<bool> + Send + Sync>;

struct Entry {
    factory: GlobalFactory,
    health: Option<GlobalHealthCheck>,
    value: Option<GlobalValue>,
}

/// Lazy keyed singleton store.
///
/// Entries are registered with a constructor during wiring, built on first
/// retrieval, and cached until an explicit rebuild. The keepalive supervisor
/// periodically health-checks entries and rebuilds the unhealthy ones in
/// place; readers only ever see the store through `get`.
pub struct GlobalStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl GlobalStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a constructor for `key`. Idempotent: the first factory wins
    /// and later registrations for the same key are ignored.
    pub fn register<F>(&self, key: &str, factory: F)
    where
        F: Fn() -> CoreResult<GlobalValue> + Send + Sync + 'static,
    {
        self.insert(key, Arc::new(factory), None);
    }

    /// Register a constructor together with a health predicate.
    pub fn register_with_health<F, H>(&self, key: &str, factory: F, health: H)
    where
        F: Fn() -> CoreResult<GlobalValue> + Send + Sync + 'static,
        H: Fn(&GlobalValue) -> CoreResult<bool> + Send + Sync + 'static,
    {
        self.insert(key, Arc::new(factory), Some(Arc::new(health)));
    }

    fn insert(&self, key: &str, factory: GlobalFactory, health: Option<GlobalHealthCheck>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.entry(key.to_string()).or_insert_with(|| {
                tracing::debug!("registered global object factory for key '{}'", key);
                Entry {
                    factory,
                    health,
                    value: None,
                }
            });
        }
    }

    /// Fetch the value for `key`, invoking the factory on first access and
    /// the cached instance afterwards.
    pub fn get(&self, key: &str) -> CoreResult<GlobalValue> {
        let factory = {
            let entries = self
                .entries
                .read()
                .map_err(|_| CoreError::lock("global_store"))?;
            match entries.get(key) {
                None => return Err(CoreError::key_not_found(key)),
                Some(entry) => match &entry.value {
                    Some(value) => return Ok(value.clone()),
                    None => entry.factory.clone(),
                },
            }
        };

        // build outside the lock so factories may themselves read the store
        let built = factory()?;

        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::lock("global_store"))?;
        let entry = entries
            .get_mut(key)
            .ok_or_else(|| CoreError::key_not_found(key))?;
        match &entry.value {
            // another caller built first; keep the cached instance
            Some(value) => Ok(value.clone()),
            None => {
                entry.value = Some(built.clone());
                Ok(built)
            }
        }
    }

    /// Typed retrieval helper.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> CoreResult<Arc<T>> {
        self.get(key)?.downcast::<T>().map_err(|_| {
            CoreError::configuration(format!(
                "global object '{key}' is not a {}",
                std::any::type_name::<T>()
            ))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Iterate over a snapshot of the entries, stopping when `f` returns
    /// false. The callback receives the cached value when one exists and is
    /// free to call back into the store.
    pub fn range(&self, mut f: impl FnMut(&str, Option<&GlobalValue>) -> bool) {
        let snapshot: Vec<(String, Option<GlobalValue>)> = match self.entries.read() {
            Ok(entries) => entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.value.clone()))
                .collect(),
            Err(_) => return,
        };
        for (key, value) in &snapshot {
            if !f(key, value.as_ref()) {
                break;
            }
        }
    }

    /// Run the entry's health predicate against its cached value. Entries
    /// without a predicate, or not yet built, are healthy.
    pub fn check_health(&self, key: &str) -> CoreResult<bool> {
        let probe = {
            let entries = self
                .entries
                .read()
                .map_err(|_| CoreError::lock("global_store"))?;
            let entry = entries
                .get(key)
                .ok_or_else(|| CoreError::key_not_found(key))?;
            match (&entry.health, &entry.value) {
                (Some(health), Some(value)) => Some((health.clone(), value.clone())),
                _ => None,
            }
        };

        match probe {
            Some((health, value)) => health(&value),
            None => Ok(true),
        }
    }

    /// Discard the cached instance for `key` and re-invoke its factory.
    ///
    /// The stale value is dropped before the rebuild, so a failing factory
    /// leaves the entry unbuilt rather than serving the old instance.
    pub fn rebuild(&self, key: &str) -> CoreResult<()> {
        let factory = {
            let mut entries = self
                .entries
                .write()
                .map_err(|_| CoreError::lock("global_store"))?;
            let entry = entries
                .get_mut(key)
                .ok_or_else(|| CoreError::key_not_found(key))?;
            entry.value = None;
            entry.factory.clone()
        };

        let built = factory()?;

        let mut entries = self
            .entries
            .write()
            .map_err(|_| CoreError::lock("global_store"))?;
        if let Some(entry) = entries.get_mut(key) {
            entry.value = Some(built);
        }
        tracing::info!("global object '{}' rebuilt", key);
        Ok(())
    }
}

impl Default for GlobalStore {
    fn default() -> Self {
        Self::new()
    }
}
