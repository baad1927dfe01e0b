use std::any::Any;
use std::sync::Arc;

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{ManagerCore, Provider, ProviderLoadFn, ProviderManager, ProviderOutput};

/// Type-policy manager for application middleware.
///
/// Every provider whose target matches the boot engine selector runs, in
/// registration order. Individual failures do not stop the walk; they are
/// aggregated into one load failure at the end.
pub struct MiddlewareManager {
    core: ManagerCore,
}

impl MiddlewareManager {
    pub fn new(ctx: &Arc<AppContext>) -> Arc<Self> {
        let manager = Arc::new(Self {
            core: ManagerCore::new(ctx.clone())
                .with_name("MiddlewareManager")
                .with_type(ctx.default_types().middleware_register.clone()),
        });
        manager.mount_to_parent(manager.clone());
        manager
            .clone()
            .set_or_bind_to_location(ctx.default_locations().app_middleware_init.clone(), true);
        manager
    }
}

impl ProviderManager for MiddlewareManager {
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
        let engine = boot.engine();

        let mut matched = 0usize;
        let mut failures = Vec::new();
        for provider in self.list() {
            if provider.target() != engine {
                continue;
            }
            matched += 1;
            if let Err(err) = provider.initialize(&ctx, &[]) {
                tracing::error!(
                    "middleware provider '{}' failed to initialize: {}",
                    provider.name(),
                    err
                );
                failures.push(format!("{}: {}", provider.name(), err));
            }
        }

        if !failures.is_empty() {
            return Err(CoreError::load_failed(failures.join("; ")));
        }
        if matched == 0 {
            tracing::debug!(
                "manager '{}' matched no middleware provider for engine '{}'",
                self.name(),
                engine
            );
        }
        Ok(None)
    }
}
