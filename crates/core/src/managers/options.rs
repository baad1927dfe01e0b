use std::any::Any;
use std::sync::Arc;

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{ManagerCore, Provider, ProviderLoadFn, ProviderManager, ProviderOutput};

/// Unique-policy manager for starter option initialization.
///
/// Holds exactly one provider for its whole life, and that provider always
/// runs. Wiring pins the provider with `bind_to_unique_manager`; once pinned,
/// further registration is rejected and unregistration is a no-op.
pub struct StarterOptionsManager {
    core: ManagerCore,
}

impl StarterOptionsManager {
    pub fn new(ctx: &Arc<AppContext>) -> Arc<Self> {
        let manager = Arc::new(Self {
            core: ManagerCore::new(ctx.clone())
                .with_name("StarterOptionsManager")
                .with_type(ctx.default_types().starter_options_unique.clone()),
        });
        manager.mount_to_parent(manager.clone());
        manager
            .clone()
            .set_or_bind_to_location(ctx.default_locations().starter_options_init.clone(), true);
        manager
    }
}

impl ProviderManager for StarterOptionsManager {
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
        let providers = self.list();
        let pinned = providers.first().ok_or_else(|| {
            CoreError::not_found(format!(
                "no provider bound to unique manager '{}'",
                self.name()
            ))
        })?;
        pinned.initialize(&ctx, &[]).map(Some)
    }
}
