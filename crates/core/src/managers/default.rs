use std::any::Any;
use std::sync::Arc;

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{ManagerCore, Provider, ProviderLoadFn, ProviderManager, ProviderOutput};

/// Catch-all manager the wiring pass routes unmatched providers to.
///
/// Mixed policy: auto-run-typed providers run unconditionally, everything
/// else runs when its target matches the boot engine selector. Failures are
/// aggregated so one broken provider cannot hide the rest.
pub struct DefaultManager {
    core: ManagerCore,
}

impl DefaultManager {
    pub fn new(ctx: &Arc<AppContext>) -> Arc<Self> {
        let manager = Arc::new(Self {
            core: ManagerCore::new(ctx.clone())
                .with_name("DefaultManager")
                .with_type(ctx.default_types().default_manager.clone()),
        });
        manager.mount_to_parent(manager.clone());
        // stays at the zero location: the bootstrapper drives it directly,
        // after every location-bound manager has run
        manager
    }
}

impl ProviderManager for DefaultManager {
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

        let providers = self.list();
        if providers.is_empty() {
            return Err(CoreError::not_found(format!(
                "no providers registered in manager '{}'",
                self.name()
            )));
        }

        let ctx = self.context();
        let boot = ctx
            .boot_config()
            .ok_or_else(|| CoreError::configuration("boot configuration is not registered"))?;
        let auto_run = ctx.default_types().auto_run.clone();

        let mut failures = Vec::new();
        for provider in providers {
            let runs = provider.provider_type().id() == auto_run.id()
                || provider.target() == boot.engine();
            if !runs {
                continue;
            }
            if let Err(err) = provider.initialize(&ctx, &[]) {
                tracing::error!(
                    "provider '{}' failed to initialize in manager '{}': {}",
                    provider.name(),
                    self.name(),
                    err
                );
                failures.push(format!("{}: {}", provider.name(), err));
            }
        }

        if !failures.is_empty() {
            return Err(CoreError::load_failed(failures.join("; ")));
        }
        Ok(None)
    }
}
