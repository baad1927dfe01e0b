use std::any::Any;
use std::sync::Arc;

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{ManagerCore, Provider, ProviderLoadFn, ProviderManager, ProviderOutput};

/// Choose-policy manager for the traffic codec.
///
/// The selection is keyed twice: the provider's name must equal the boot
/// codec selector and its target must equal the boot engine, so one codec
/// choice can carry per-engine implementations side by side.
pub struct CodecManager {
    core: ManagerCore,
}

impl CodecManager {
    pub fn new(ctx: &Arc<AppContext>) -> Arc<Self> {
        let manager = Arc::new(Self {
            core: ManagerCore::new(ctx.clone())
                .with_name("CodecManager")
                .with_type(ctx.default_types().codec_choose.clone()),
        });
        manager.mount_to_parent(manager.clone());
        manager
            .clone()
            .set_or_bind_to_location(ctx.default_locations().engine_init.clone(), true);
        manager
    }
}

impl ProviderManager for CodecManager {
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

        if self.list().is_empty() {
            return Err(CoreError::not_found(format!(
                "no codec provider registered in manager '{}'",
                self.name()
            )));
        }

        let ctx = self.context();
        let boot = ctx
            .boot_config()
            .ok_or_else(|| CoreError::configuration("boot configuration is not registered"))?;
        let wanted_type = self.manager_type();

        for provider in self.list() {
            if provider.provider_type().id() == wanted_type.id()
                && provider.name() == boot.codec()
                && provider.target() == boot.engine()
            {
                tracing::info!(
                    "manager '{}' selected codec '{}' for engine '{}'",
                    self.name(),
                    provider.name(),
                    boot.engine()
                );
                return provider.initialize(&ctx, &[]).map(Some);
            }
        }
        Err(CoreError::not_found(format!(
            "codec '{}' for engine '{}' in manager '{}'",
            boot.codec(),
            boot.engine(),
            self.name()
        )))
    }
}
