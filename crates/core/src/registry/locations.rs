use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::errors::{CoreError, CoreResult};
use crate::providers::ProviderManager;

use super::{CUSTOM_RANGE_END, CUSTOM_RANGE_START, DEFAULT_RANGE_END, DEFAULT_RANGE_START, RESERVED_ZERO_NAME};

/// Named point in the bootstrap sequence.
///
/// Managers bind here during wiring; the bootstrapper later asks a location
/// for its managers and executes them in bind order. Locations are shared
/// handles because they accumulate the bind list.
pub struct ProviderLocation {
    id: u8,
    name: Arc<str>,
    managers: RwLock<Vec<Arc<dyn ProviderManager>>>,
}

impl ProviderLocation {
    fn new(id: u8, name: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: Arc::from(name),
            managers: RwLock::new(Vec::new()),
        })
    }

    /// Numeric id, unique across both namespaces.
    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the id falls inside the reserved default range.
    pub fn is_default(&self) -> bool {
        self.id <= DEFAULT_RANGE_END
    }

    /// Whether this is the zero sentinel.
    pub fn is_zero(&self) -> bool {
        self.id == 0
    }

    /// Append a manager to this location's ordered bind list.
    ///
    /// A duplicate bind from the same manager is rejected and the list is
    /// left unchanged; distinct managers append in call order.
    pub fn bind(&self, manager: Arc<dyn ProviderManager>) -> CoreResult<()> {
        let mut managers = self
            .managers
            .write()
            .map_err(|_| CoreError::lock("location_managers"))?;

        if managers.iter().any(|bound| bound.name() == manager.name()) {
            return Err(CoreError::conflict(format!(
                "manager '{}' already bound to location '{}'",
                manager.name(),
                self.name
            )));
        }

        tracing::debug!("bound manager '{}' to location '{}'", manager.name(), self.name);
        managers.push(manager);
        Ok(())
    }

    /// Snapshot of the bound managers, in bind order.
    pub fn managers(&self) -> Vec<Arc<dyn ProviderManager>> {
        self.managers
            .read()
            .map(|managers| managers.clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ProviderLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderLocation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("managers", &self.managers())
            .finish()
    }
}

impl std::fmt::Debug for dyn ProviderManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProviderManager({})", self.name())
    }
}

struct LocationNamespaces {
    defaults: HashMap<String, Arc<ProviderLocation>>,
    customs: HashMap<String, Arc<ProviderLocation>>,
    // u16 so allocation past the top of the custom range fails instead of wrapping
    next_default: u16,
    next_custom: u16,
}

/// Dual-namespace registry assigning unique small ids to location names.
///
/// Structurally the twin of `TypeRegistry`: append-only, monotonic ids per
/// namespace, no removal, registration serialized by an internal lock.
pub struct LocationRegistry {
    inner: Mutex<LocationNamespaces>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LocationNamespaces {
                defaults: HashMap::new(),
                customs: HashMap::new(),
                next_default: DEFAULT_RANGE_START as u16,
                next_custom: CUSTOM_RANGE_START as u16,
            }),
        }
    }

    /// Register `name` in the reserved default range (0-63).
    pub fn default(&self, name: &str) -> CoreResult<Arc<ProviderLocation>> {
        let mut ns = self
            .inner
            .lock()
            .map_err(|_| CoreError::lock("location_registry"))?;

        if ns.defaults.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "default location name '{name}' already registered"
            )));
        }
        if ns.customs.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "location name '{name}' already registered as a custom location"
            )));
        }
        if ns.next_default > DEFAULT_RANGE_END as u16 {
            return Err(CoreError::configuration(format!(
                "default location ids exhausted (max {DEFAULT_RANGE_END})"
            )));
        }

        let location = ProviderLocation::new(ns.next_default as u8, name);
        ns.next_default += 1;
        ns.defaults.insert(name.to_string(), location.clone());
        tracing::debug!("registered default location '{}' (id {})", name, location.id());
        Ok(location)
    }

    /// Register `name` in the open custom range (64-255).
    pub fn custom(&self, name: &str) -> CoreResult<Arc<ProviderLocation>> {
        let mut ns = self
            .inner
            .lock()
            .map_err(|_| CoreError::lock("location_registry"))?;

        if ns.customs.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "custom location name '{name}' already registered"
            )));
        }
        if ns.defaults.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "location name '{name}' already registered as a default location"
            )));
        }
        if ns.next_custom > CUSTOM_RANGE_END as u16 {
            return Err(CoreError::configuration(format!(
                "custom location ids exhausted (max {CUSTOM_RANGE_END})"
            )));
        }

        let location = ProviderLocation::new(ns.next_custom as u8, name);
        ns.next_custom += 1;
        ns.customs.insert(name.to_string(), location.clone());
        tracing::debug!("registered custom location '{}' (id {})", name, location.id());
        Ok(location)
    }

    /// Look a location up by name, custom namespace first, then default.
    pub fn lookup(&self, name: &str) -> CoreResult<Arc<ProviderLocation>> {
        let ns = self
            .inner
            .lock()
            .map_err(|_| CoreError::lock("location_registry"))?;

        if let Some(location) = ns.customs.get(name) {
            return Ok(location.clone());
        }
        if let Some(location) = ns.defaults.get(name) {
            return Ok(location.clone());
        }
        Err(CoreError::not_found(format!("location '{name}'")))
    }

    /// Like `default`, aborting on failure. Static wiring only.
    pub fn must_default(&self, name: &str) -> Arc<ProviderLocation> {
        match self.default(name) {
            Ok(location) => location,
            Err(err) => panic!("failed to register default location '{name}': {err}"),
        }
    }

    /// Like `custom`, aborting on failure. Static wiring only.
    pub fn must_custom(&self, name: &str) -> Arc<ProviderLocation> {
        match self.custom(name) {
            Ok(location) => location,
            Err(err) => panic!("failed to register custom location '{name}': {err}"),
        }
    }

    /// Like `lookup`, aborting on failure. Static wiring only.
    pub fn must_lookup(&self, name: &str) -> Arc<ProviderLocation> {
        match self.lookup(name) {
            Ok(location) => location,
            Err(err) => panic!("failed to look up location '{name}': {err}"),
        }
    }
}

/// Predefined default locations covering the bootstrap sequence, registered
/// into the reserved range when an application context is built.
pub struct DefaultLocations {
    /// Zero sentinel; managers start here until placed.
    pub zero: Arc<ProviderLocation>,
    pub bootstrap_config: Arc<ProviderLocation>,
    pub starter_options_init: Arc<ProviderLocation>,
    pub engine_options_init: Arc<ProviderLocation>,
    pub starter_create: Arc<ProviderLocation>,
    pub engine_create: Arc<ProviderLocation>,
    pub global_init: Arc<ProviderLocation>,
    pub keepalive_init: Arc<ProviderLocation>,
    pub engine_init: Arc<ProviderLocation>,
    pub hook_init: Arc<ProviderLocation>,
    pub context_adapt_init: Arc<ProviderLocation>,
    pub app_middleware_init: Arc<ProviderLocation>,
    pub module_middleware_init: Arc<ProviderLocation>,
    pub route_register_init: Arc<ProviderLocation>,
    pub response_init: Arc<ProviderLocation>,
    pub server_run_before: Arc<ProviderLocation>,
    pub server_run: Arc<ProviderLocation>,
    pub server_run_after: Arc<ProviderLocation>,
    pub server_shutdown_before: Arc<ProviderLocation>,
    pub server_shutdown: Arc<ProviderLocation>,
    pub server_shutdown_after: Arc<ProviderLocation>,
}

impl DefaultLocations {
    /// Register the default set. Call once per registry, before any custom
    /// registration, so the zero sentinel lands on id 0.
    pub fn register(registry: &LocationRegistry) -> Self {
        Self {
            zero: registry.must_default(RESERVED_ZERO_NAME),
            bootstrap_config: registry.must_default("BootstrapConfig"),
            starter_options_init: registry.must_default("StarterOptionsInit"),
            engine_options_init: registry.must_default("EngineOptionsInit"),
            starter_create: registry.must_default("StarterCreate"),
            engine_create: registry.must_default("EngineCreate"),
            global_init: registry.must_default("GlobalInit"),
            keepalive_init: registry.must_default("GlobalKeepaliveInit"),
            engine_init: registry.must_default("EngineInit"),
            hook_init: registry.must_default("HookInit"),
            context_adapt_init: registry.must_default("ContextAdaptInit"),
            app_middleware_init: registry.must_default("AppMiddlewareInit"),
            module_middleware_init: registry.must_default("ModuleMiddlewareInit"),
            route_register_init: registry.must_default("RouteRegisterInit"),
            response_init: registry.must_default("ResponseInfoInit"),
            server_run_before: registry.must_default("ServerRunBefore"),
            server_run: registry.must_default("ServerRun"),
            server_run_after: registry.must_default("ServerRunAfter"),
            server_shutdown_before: registry.must_default("ServerShutdownBefore"),
            server_shutdown: registry.must_default("ServerShutdown"),
            server_shutdown_after: registry.must_default("ServerShutdownAfter"),
        }
    }
}
