use std::any::Any;
use std::sync::Arc;

use crate::constants::DEFAULT_ENGINE;
use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{ManagerCore, Provider, ProviderLoadFn, ProviderManager, ProviderOutput};

/// Choose-policy manager for the core engine.
///
/// Exactly one provider runs: the first whose target equals the boot engine
/// selector. Remaining matches are skipped and a missing match is an explicit
/// failure, never a silent default.
pub struct EngineManager {
    core: ManagerCore,
}

impl EngineManager {
    pub fn new(ctx: &Arc<AppContext>) -> Arc<Self> {
        let manager = Arc::new(Self {
            core: ManagerCore::new(ctx.clone())
                .with_name("EngineManager")
                .with_type(ctx.default_types().engine_choose.clone()),
        });
        manager.mount_to_parent(manager.clone());
        manager
            .clone()
            .set_or_bind_to_location(ctx.default_locations().engine_create.clone(), true);
        manager
    }
}

impl ProviderManager for EngineManager {
    fn core(&self) -> &ManagerCore {
        &self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn load_provider(&self, load_fns: &[ProviderLoadFn]) -> CoreResult<Option<ProviderOutput>> {
        self.check();
        if let Some(load) = load_fns.first() {
            return load(self);
        }

        let ctx = self.context();
        let boot = ctx
            .boot_config()
            .ok_or_else(|| CoreError::configuration("boot configuration is not registered"))?;
        let engine = if boot.engine().is_empty() {
            DEFAULT_ENGINE
        } else {
            boot.engine()
        };

        for provider in self.list() {
            if provider.target() == engine {
                tracing::info!(
                    "manager '{}' selected provider '{}' for engine '{}'",
                    self.name(),
                    provider.name(),
                    engine
                );
                return provider.initialize(&ctx, &[]).map(Some);
            }
        }
        Err(CoreError::not_found(format!(
            "provider for engine '{engine}' in manager '{}'",
            self.name()
        )))
    }
}
