use std::any::Any;
use std::sync::Arc;

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{ManagerCore, Provider, ProviderLoadFn, ProviderManager, ProviderOutput};

/// AutoRun-policy manager for global initialization.
///
/// Every registered provider runs once, unconditionally; targets are not
/// consulted. Typical providers here register constructed singletons into the
/// global store. Failures are aggregated, not short-circuited.
pub struct GlobalInitManager {
    core: ManagerCore,
}

impl GlobalInitManager {
    pub fn new(ctx: &Arc<AppContext>) -> Arc<Self> {
        let manager = Arc::new(Self {
            core: ManagerCore::new(ctx.clone())
                .with_name("GlobalInitManager")
                .with_type(ctx.default_types().auto_run.clone()),
        });
        manager.mount_to_parent(manager.clone());
        manager
            .clone()
            .set_or_bind_to_location(ctx.default_locations().global_init.clone(), true);
        manager
    }
}

impl ProviderManager for GlobalInitManager {
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
        let mut failures = Vec::new();
        for provider in self.list() {
            if let Err(err) = provider.initialize(&ctx, &[]) {
                tracing::error!(
                    "auto-run provider '{}' failed to initialize: {}",
                    provider.name(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, BootConfig};
    use crate::providers::Provider;
    use crate::testing::RecordingProvider;

    fn ctx() -> Arc<AppContext> {
        let ctx = AppContext::new(AppConfig::default());
        ctx.register_boot_config(BootConfig::new("axum", "serde-json"));
        ctx
    }

    #[test]
    fn every_provider_runs_regardless_of_target() {
        let ctx = ctx();
        let manager = GlobalInitManager::new(&ctx);
        let auto_run = ctx.default_types().auto_run.clone();

        let providers = [
            RecordingProvider::mounted("a", "axum", auto_run.clone()),
            RecordingProvider::mounted("b", "actix", auto_run.clone()),
            RecordingProvider::mounted("c", "", auto_run),
        ];
        for provider in &providers {
            provider.register_to(manager.as_ref()).unwrap();
        }

        manager.load_provider(&[]).unwrap();
        for provider in &providers {
            assert_eq!(provider.run_count(), 1);
        }
    }

    #[test]
    fn an_empty_collection_loads_nothing() {
        let ctx = ctx();
        let manager = GlobalInitManager::new(&ctx);
        assert!(manager.load_provider(&[]).unwrap().is_none());
    }

    #[test]
    fn failures_aggregate_across_the_collection() {
        let ctx = ctx();
        let manager = GlobalInitManager::new(&ctx);
        let auto_run = ctx.default_types().auto_run.clone();

        RecordingProvider::failing("x", "axum", auto_run.clone())
            .register_to(manager.as_ref())
            .unwrap();
        let survivor = RecordingProvider::mounted("y", "axum", auto_run);
        survivor.register_to(manager.as_ref()).unwrap();

        assert!(manager.load_provider(&[]).is_err());
        assert_eq!(survivor.run_count(), 1);
    }
}
