use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{CoreError, CoreResult};

use super::{CUSTOM_RANGE_END, CUSTOM_RANGE_START, DEFAULT_RANGE_END, DEFAULT_RANGE_START, RESERVED_ZERO_NAME};

/// Classification tag for providers and managers.
///
/// The name suffix carries the selection-policy convention (`...Choose`,
/// `...Type`, `...AutoRun`, `...Unique`); nothing enforces it at the type
/// level. Handles are cheap to clone and compare by content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderType {
    id: u8,
    name: Arc<str>,
}

impl ProviderType {
    /// Reserved zero sentinel meaning "not yet classified".
    pub fn zero() -> Self {
        Self {
            id: 0,
            name: Arc::from(RESERVED_ZERO_NAME),
        }
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
}

struct TypeNamespaces {
    defaults: HashMap<String, ProviderType>,
    customs: HashMap<String, ProviderType>,
    // u16 so allocation past the top of the custom range fails instead of wrapping
    next_default: u16,
    next_custom: u16,
}

/// Dual-namespace registry assigning unique small ids to provider type names.
///
/// Append-only: ids are allocated monotonically per namespace and never
/// reused, and there is no removal operation. Registration is serialized by
/// an internal lock, though in practice all of it happens single-threaded
/// during startup wiring.
pub struct TypeRegistry {
    inner: Mutex<TypeNamespaces>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TypeNamespaces {
                defaults: HashMap::new(),
                customs: HashMap::new(),
                next_default: DEFAULT_RANGE_START as u16,
                next_custom: CUSTOM_RANGE_START as u16,
            }),
        }
    }

    /// Register `name` in the reserved default range (0-63).
    ///
    /// Fails when the name already exists in either namespace or the range is
    /// exhausted.
    pub fn default(&self, name: &str) -> CoreResult<ProviderType> {
        let mut ns = self
            .inner
            .lock()
            .map_err(|_| CoreError::lock("type_registry"))?;

        if ns.defaults.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "default type name '{name}' already registered"
            )));
        }
        if ns.customs.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "type name '{name}' already registered as a custom type"
            )));
        }
        if ns.next_default > DEFAULT_RANGE_END as u16 {
            return Err(CoreError::configuration(format!(
                "default type ids exhausted (max {DEFAULT_RANGE_END})"
            )));
        }

        let ptype = ProviderType {
            id: ns.next_default as u8,
            name: Arc::from(name),
        };
        ns.next_default += 1;
        ns.defaults.insert(name.to_string(), ptype.clone());
        tracing::debug!("registered default provider type '{}' (id {})", name, ptype.id());
        Ok(ptype)
    }

    /// Register `name` in the open custom range (64-255).
    pub fn custom(&self, name: &str) -> CoreResult<ProviderType> {
        let mut ns = self
            .inner
            .lock()
            .map_err(|_| CoreError::lock("type_registry"))?;

        if ns.customs.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "custom type name '{name}' already registered"
            )));
        }
        if ns.defaults.contains_key(name) {
            return Err(CoreError::conflict(format!(
                "type name '{name}' already registered as a default type"
            )));
        }
        if ns.next_custom > CUSTOM_RANGE_END as u16 {
            return Err(CoreError::configuration(format!(
                "custom type ids exhausted (max {CUSTOM_RANGE_END})"
            )));
        }

        let ptype = ProviderType {
            id: ns.next_custom as u8,
            name: Arc::from(name),
        };
        ns.next_custom += 1;
        ns.customs.insert(name.to_string(), ptype.clone());
        tracing::debug!("registered custom provider type '{}' (id {})", name, ptype.id());
        Ok(ptype)
    }

    /// Look a type up by name, custom namespace first, then default.
    pub fn lookup(&self, name: &str) -> CoreResult<ProviderType> {
        let ns = self
            .inner
            .lock()
            .map_err(|_| CoreError::lock("type_registry"))?;

        if let Some(ptype) = ns.customs.get(name) {
            return Ok(ptype.clone());
        }
        if let Some(ptype) = ns.defaults.get(name) {
            return Ok(ptype.clone());
        }
        Err(CoreError::not_found(format!("type '{name}'")))
    }

    /// Like `default`, aborting on failure. Static wiring only.
    pub fn must_default(&self, name: &str) -> ProviderType {
        match self.default(name) {
            Ok(ptype) => ptype,
            Err(err) => panic!("failed to register default type '{name}': {err}"),
        }
    }

    /// Like `custom`, aborting on failure. Static wiring only.
    pub fn must_custom(&self, name: &str) -> ProviderType {
        match self.custom(name) {
            Ok(ptype) => ptype,
            Err(err) => panic!("failed to register custom type '{name}': {err}"),
        }
    }

    /// Like `lookup`, aborting on failure. Static wiring only.
    pub fn must_lookup(&self, name: &str) -> ProviderType {
        match self.lookup(name) {
            Ok(ptype) => ptype,
            Err(err) => panic!("failed to look up type '{name}': {err}"),
        }
    }
}

/// Predefined default provider types, registered into the reserved range when
/// an application context is built.
///
/// Suffix conventions carried by the names:
/// 1. `...Choose` - exactly one matching provider (by target) runs; the first
///    match wins and the rest are skipped.
/// 2. `...Type` - every provider matching the selector runs.
/// 3. `...AutoRun` - every registered provider runs, unconditionally.
/// 4. `...Unique` - the manager accepts exactly one provider ever, and that
///    provider always runs.
pub struct DefaultTypes {
    /// Zero sentinel; providers and managers start here until classified.
    pub zero: ProviderType,
    /// Catch-all group handled by the default manager.
    pub default_manager: ProviderType,
    /// Traffic codec selection group.
    pub codec_choose: ProviderType,
    /// Core engine selection group.
    pub engine_choose: ProviderType,
    /// Application middleware registration group.
    pub middleware_register: ProviderType,
    /// Route registration group.
    pub route_register: ProviderType,
    /// Engine hook selection group.
    pub hook_choose: ProviderType,
    /// Framework starter selection group.
    pub starter_choose: ProviderType,
    /// Unconditional one-shot providers (global object registration and the like).
    pub auto_run: ProviderType,
    /// Request context adaptor selection group.
    pub context_choose: ProviderType,
    /// Starter option initialization; exactly one provider, uniquely bound.
    pub starter_options_unique: ProviderType,
    /// Engine option initialization; exactly one provider, uniquely bound.
    pub engine_options_unique: ProviderType,
    /// Panic-recovery middleware selection group.
    pub recover_choose: ProviderType,
    /// Response encoding selection group.
    pub response_choose: ProviderType,
}

impl DefaultTypes {
    /// Register the default set. Call once per registry, before any custom
    /// registration, so the zero sentinel lands on id 0.
    pub fn register(registry: &TypeRegistry) -> Self {
        Self {
            zero: registry.must_default(RESERVED_ZERO_NAME),
            default_manager: registry.must_default("DefaultManagerType"),
            codec_choose: registry.must_default("CodecChoose"),
            engine_choose: registry.must_default("EngineChoose"),
            middleware_register: registry.must_default("MiddlewareRegisterType"),
            route_register: registry.must_default("RouteRegisterType"),
            hook_choose: registry.must_default("HookChoose"),
            starter_choose: registry.must_default("StarterChoose"),
            auto_run: registry.must_default("ProviderAutoRun"),
            context_choose: registry.must_default("ContextChoose"),
            starter_options_unique: registry.must_default("StarterOptionsUnique"),
            engine_options_unique: registry.must_default("EngineOptionsUnique"),
            recover_choose: registry.must_default("RecoverChoose"),
            response_choose: registry.must_default("ResponseChoose"),
        }
    }
}
