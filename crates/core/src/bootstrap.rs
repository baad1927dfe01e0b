use std::sync::Arc;

use crate::context::AppContext;
use crate::managers::DefaultManager;
use crate::providers::{Provider, ProviderManager};

/// Wiring assembly for the single startup pass.
///
/// Collects the providers and managers an application brings, then matches
/// every provider to the first manager carrying the same type. Providers no
/// manager claims land in a catch-all [`DefaultManager`] appended to the set.
/// The returned managers are what the (external) bootstrapper drives, walking
/// each location's bind list in order.
pub struct Rig {
    ctx: Arc<AppContext>,
    providers: Vec<Arc<dyn Provider>>,
    managers: Vec<Arc<dyn ProviderManager>>,
}

impl Rig {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            providers: Vec::new(),
            managers: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Add a provider to the wiring set
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Add several providers to the wiring set
    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Arc<dyn Provider>>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Add a manager to the wiring set
    pub fn with_manager(mut self, manager: Arc<dyn ProviderManager>) -> Self {
        self.managers.push(manager);
        self
    }

    /// Add several managers to the wiring set
    pub fn with_managers(
        mut self,
        managers: impl IntoIterator<Item = Arc<dyn ProviderManager>>,
    ) -> Self {
        self.managers.extend(managers);
        self
    }

    /// Run the matching pass and hand back the full manager set.
    ///
    /// A registration failure (typically a duplicate name) is logged and
    /// skipped; wiring continues with the remaining providers.
    pub fn wire(self) -> Vec<Arc<dyn ProviderManager>> {
        let mut managers = self.managers;
        let default_manager: Arc<dyn ProviderManager> = DefaultManager::new(&self.ctx);
        managers.push(default_manager.clone());

        for provider in &self.providers {
            let slot = managers
                .iter()
                .find(|manager| manager.manager_type().id() == provider.provider_type().id())
                .cloned()
                .unwrap_or_else(|| default_manager.clone());
            if let Err(err) = provider.register_to(slot.as_ref()) {
                tracing::error!(
                    "provider '{}' failed to register with manager '{}': {}",
                    provider.name(),
                    slot.name(),
                    err
                );
            }
        }

        tracing::info!(
            "wired {} providers across {} managers",
            self.providers.len(),
            managers.len()
        );
        managers
    }
}
