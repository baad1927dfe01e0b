use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{Provider, ProviderOutput};
use crate::registry::{ProviderLocation, ProviderType};

/// Caller-supplied load hook. When handed to `load_provider`, the first hook
/// replaces the manager's built-in selection policy for that call.
pub type ProviderLoadFn =
    Box<dyn Fn(&dyn ProviderManager) -> CoreResult<Option<ProviderOutput>> + Send + Sync>;

/// Capability contract for a typed collection of providers bound to one
/// location, resolving which of them actually run.
///
/// Concrete managers compose a [`ManagerCore`] and override `load_provider`
/// with their selection policy. Resolution is recomputed on every call; the
/// manager caches nothing, and double-initialization is prevented only by
/// each selected provider's own one-shot status.
pub trait ProviderManager: Send + Sync {
    /// Shared manager state.
    fn core(&self) -> &ManagerCore;

    /// `Any` view of the concrete instance, for downcasting.
    fn as_any(&self) -> &dyn Any;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn manager_type(&self) -> ProviderType {
        self.core().manager_type()
    }

    fn location(&self) -> Arc<ProviderLocation> {
        self.core().location()
    }

    fn context(&self) -> Arc<AppContext> {
        self.core().context()
    }

    /// Panics when the manager type was never set. Concrete `load_provider`
    /// implementations call this first.
    fn check(&self) {
        self.core().ensure_type_set();
    }

    fn is_unique(&self) -> bool {
        self.core().is_unique()
    }

    fn register(&self, provider: Arc<dyn Provider>) -> CoreResult<()> {
        self.core().register(provider)
    }

    fn unregister(&self, name: &str) -> CoreResult<()> {
        self.core().unregister(name)
    }

    fn get_provider(&self, name: &str) -> CoreResult<Arc<dyn Provider>> {
        self.core().get_provider(name)
    }

    /// Registered providers, in registration order.
    fn list(&self) -> Vec<Arc<dyn Provider>> {
        self.core().list()
    }

    /// Resolve and run provider(s) per this manager's policy.
    ///
    /// The base behavior forwards to the mounted delegate after `check`, with
    /// explicit delegation errors when nothing is mounted.
    fn load_provider(&self, load_fns: &[ProviderLoadFn]) -> CoreResult<Option<ProviderOutput>> {
        self.check();
        let delegate = self.core().forward_target()?;
        delegate.load_provider(load_fns)
    }

    /// Pin `provider` as the only provider this manager will ever hold.
    /// Structural misuse aborts; see [`ManagerCore::bind_to_unique_provider`].
    fn bind_to_unique_provider(&self, provider: Arc<dyn Provider>) {
        self.core().bind_to_unique_provider(provider);
    }

    /// Attach the concrete instance this manager's base forwards to.
    /// Mounting the base onto itself aborts.
    fn mount_to_parent(&self, delegate: Arc<dyn ProviderManager>) {
        self.core().mount(delegate);
    }

    /// Set the execution location; with `bind`, also append this manager (its
    /// delegate if mounted, else itself) to the location's ordered bind list.
    /// Convention: called exactly once, at construction.
    fn set_or_bind_to_location(self: Arc<Self>, location: Arc<ProviderLocation>, bind: bool)
    where
        Self: Sized + 'static,
    {
        self.core().set_location(location.clone());
        if bind {
            let bound: Arc<dyn ProviderManager> = match self.core().delegate() {
                Some(delegate) => delegate,
                None => self.clone(),
            };
            if let Err(err) = location.bind(bound) {
                tracing::warn!(
                    "manager '{}' not re-bound to location '{}': {}",
                    self.name(),
                    location.name(),
                    err
                );
            }
        }
    }
}

/// Composed base state shared by every manager: identity, context handle,
/// the ordered provider collection, one-shot type, location, unique mode,
/// and the delegate slot.
///
/// Not designed for concurrent mutation after startup; wiring is
/// single-threaded by contract and serving-time calls only read.
pub struct ManagerCore {
    name: String,
    ctx: Arc<AppContext>,
    providers: RwLock<Vec<Arc<dyn Provider>>>,
    mtype: OnceLock<ProviderType>,
    location: RwLock<Arc<ProviderLocation>>,
    unique: AtomicBool,
    delegate: RwLock<Option<Arc<dyn ProviderManager>>>,
}

impl ManagerCore {
    /// Create a base manager on the given context, starting at the zero type
    /// and zero location sentinels.
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let zero_location = ctx.default_locations().zero.clone();
        Self {
            name: String::new(),
            ctx,
            providers: RwLock::new(Vec::new()),
            mtype: OnceLock::new(),
            location: RwLock::new(zero_location),
            unique: AtomicBool::new(false),
            delegate: RwLock::new(None),
        }
    }

    /// Set the manager name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the manager type. One-shot; a later set is ignored.
    pub fn with_type(self, mtype: ProviderType) -> Self {
        let _ = self.mtype.set(mtype);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Classification, or the zero sentinel when never set.
    pub fn manager_type(&self) -> ProviderType {
        self.mtype.get().cloned().unwrap_or_else(ProviderType::zero)
    }

    /// Abort when the type is still the zero sentinel.
    pub fn ensure_type_set(&self) {
        if self.manager_type().is_zero() {
            panic!("manager '{}' type is not set", self.name);
        }
    }

    pub fn context(&self) -> Arc<AppContext> {
        self.ctx.clone()
    }

    /// Execution location; the zero sentinel until placed.
    pub fn location(&self) -> Arc<ProviderLocation> {
        self.location
            .read()
            .map(|location| location.clone())
            .unwrap_or_else(|_| self.ctx.default_locations().zero.clone())
    }

    pub fn set_location(&self, location: Arc<ProviderLocation>) {
        if let Ok(mut slot) = self.location.write() {
            *slot = location;
        }
    }

    pub fn is_unique(&self) -> bool {
        self.unique.load(Ordering::SeqCst)
    }

    /// Add a provider to the collection.
    ///
    /// Fails on a duplicate name, or on any registration once the manager is
    /// in unique provider mode.
    pub fn register(&self, provider: Arc<dyn Provider>) -> CoreResult<()> {
        let mut providers = self
            .providers
            .write()
            .map_err(|_| CoreError::lock("manager_providers"))?;

        if self.is_unique() && !providers.is_empty() {
            return Err(CoreError::conflict(format!(
                "manager '{}' is in unique provider mode and cannot register another provider",
                self.name
            )));
        }
        if providers.iter().any(|known| known.name() == provider.name()) {
            return Err(CoreError::conflict(format!(
                "provider '{}' already registered in manager '{}'",
                provider.name(),
                self.name
            )));
        }

        tracing::info!(
            "registering provider '{}' in manager '{}'",
            provider.name(),
            self.name
        );
        providers.push(provider);
        Ok(())
    }

    /// Remove a provider by name.
    ///
    /// Deliberately a no-op for unique managers: one-shot configuration
    /// managers must not lose their provider after wiring.
    pub fn unregister(&self, name: &str) -> CoreResult<()> {
        if self.is_unique() {
            return Ok(());
        }
        let mut providers = self
            .providers
            .write()
            .map_err(|_| CoreError::lock("manager_providers"))?;

        match providers.iter().position(|known| known.name() == name) {
            Some(index) => {
                providers.remove(index);
                Ok(())
            }
            None => Err(CoreError::not_found(format!(
                "provider '{name}' in manager '{}'",
                self.name
            ))),
        }
    }

    pub fn get_provider(&self, name: &str) -> CoreResult<Arc<dyn Provider>> {
        let providers = self
            .providers
            .read()
            .map_err(|_| CoreError::lock("manager_providers"))?;
        providers
            .iter()
            .find(|known| known.name() == name)
            .cloned()
            .ok_or_else(|| {
                CoreError::not_found(format!("provider '{name}' in manager '{}'", self.name))
            })
    }

    /// Snapshot of the collection, in registration order.
    pub fn list(&self) -> Vec<Arc<dyn Provider>> {
        self.providers
            .read()
            .map(|providers| providers.clone())
            .unwrap_or_default()
    }

    /// Pin `provider` as the only provider this manager will ever hold.
    ///
    /// A repeat bind of the same instance is a no-op success. Finding a
    /// different provider, or more than one, is a structural wiring defect
    /// and aborts rather than returning an error.
    pub fn bind_to_unique_provider(&self, provider: Arc<dyn Provider>) {
        let mut providers = match self.providers.write() {
            Ok(providers) => providers,
            Err(_) => panic!("manager '{}' provider list lock poisoned", self.name),
        };

        match providers.len() {
            0 => {
                tracing::info!(
                    "manager '{}' uniquely bound to provider '{}'",
                    self.name,
                    provider.name()
                );
                providers.push(provider);
                self.unique.store(true, Ordering::SeqCst);
            }
            1 => {
                let existing = &providers[0];
                let same_instance = Arc::as_ptr(existing) as *const ()
                    == Arc::as_ptr(&provider) as *const ();
                if same_instance {
                    // repeat bind of the same instance: nothing to do
                    self.unique.store(true, Ordering::SeqCst);
                } else {
                    panic!(
                        "manager '{}' already holds a different provider, cannot bind unique provider '{}'",
                        self.name,
                        provider.name()
                    );
                }
            }
            count => panic!(
                "manager '{}' already holds {count} providers, cannot bind a unique provider",
                self.name
            ),
        }
    }

    /// Mounted delegate, if any.
    pub fn delegate(&self) -> Option<Arc<dyn ProviderManager>> {
        self.delegate
            .read()
            .ok()
            .and_then(|slot| slot.clone())
    }

    /// Delegate to forward to, or the delegation error describing what is
    /// missing.
    pub(crate) fn forward_target(&self) -> CoreResult<Arc<dyn ProviderManager>> {
        let delegate = self
            .delegate()
            .ok_or_else(|| CoreError::delegate_not_mounted(self.name.as_str()))?;
        if let Some(base) = delegate.as_any().downcast_ref::<ManagerCore>() {
            if std::ptr::eq(base, self) {
                return Err(CoreError::self_delegation(self.name.as_str()));
            }
        }
        Ok(delegate)
    }

    /// Mount the concrete instance this core forwards to. Mounting the core
    /// onto itself aborts.
    pub fn mount(&self, delegate: Arc<dyn ProviderManager>) {
        if let Some(base) = delegate.as_any().downcast_ref::<ManagerCore>() {
            if std::ptr::eq(base, self) {
                panic!(
                    "manager '{}': delegate cannot be the base instance itself",
                    self.name
                );
            }
        }
        if let Ok(mut slot) = self.delegate.write() {
            *slot = Some(delegate);
        }
    }
}

impl ProviderManager for ManagerCore {
    fn core(&self) -> &ManagerCore {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::testing::RecordingProvider;

    fn ctx() -> Arc<AppContext> {
        AppContext::new(AppConfig::default())
    }

    fn typed_core(ctx: &Arc<AppContext>, name: &str) -> ManagerCore {
        ManagerCore::new(ctx.clone())
            .with_name(name)
            .with_type(ctx.default_types().engine_choose.clone())
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "EngineManager");
        let defaults = ctx.default_types();

        let first = RecordingProvider::mounted("p", "axum", defaults.engine_choose.clone());
        let second = RecordingProvider::mounted("p", "actix", defaults.engine_choose.clone());

        manager.register(first).unwrap();
        assert!(manager.register(second).unwrap_err().is_conflict());
        assert_eq!(manager.list().len(), 1);
    }

    #[test]
    fn list_preserves_registration_order() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "EngineManager");
        let defaults = ctx.default_types();

        for name in ["a", "b", "c"] {
            manager
                .register(RecordingProvider::mounted(
                    name,
                    "axum",
                    defaults.engine_choose.clone(),
                ))
                .unwrap();
        }

        let names: Vec<String> = manager
            .list()
            .iter()
            .map(|provider| provider.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn load_provider_without_a_delegate_is_a_delegation_error() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "EngineManager");
        assert!(manager.load_provider(&[]).unwrap_err().is_delegation());
    }

    #[test]
    #[should_panic(expected = "type is not set")]
    fn load_provider_aborts_when_the_type_was_never_set() {
        let ctx = ctx();
        let manager = ManagerCore::new(ctx).with_name("untyped");
        let _ = manager.load_provider(&[]);
    }

    #[test]
    #[should_panic(expected = "delegate cannot be the base instance itself")]
    fn mounting_the_base_onto_itself_aborts() {
        let ctx = ctx();
        let manager = Arc::new(typed_core(&ctx, "EngineManager"));
        manager.mount_to_parent(manager.clone());
    }

    #[test]
    fn unique_bind_is_idempotent_for_the_same_instance() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "OptionsManager");
        let provider = RecordingProvider::mounted(
            "options",
            "axum",
            ctx.default_types().starter_options_unique.clone(),
        );

        manager.bind_to_unique_provider(provider.clone());
        assert!(manager.is_unique());

        // repeat bind of the same instance is a silent success
        manager.bind_to_unique_provider(provider);
        assert!(manager.is_unique());
        assert_eq!(manager.list().len(), 1);
    }

    #[test]
    #[should_panic(expected = "different provider")]
    fn unique_bind_with_a_different_provider_aborts() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "OptionsManager");
        let defaults = ctx.default_types();

        manager.bind_to_unique_provider(RecordingProvider::mounted(
            "a",
            "axum",
            defaults.starter_options_unique.clone(),
        ));
        manager.bind_to_unique_provider(RecordingProvider::mounted(
            "b",
            "axum",
            defaults.starter_options_unique.clone(),
        ));
    }

    #[test]
    fn unique_mode_rejects_further_registration() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "OptionsManager");
        let defaults = ctx.default_types();

        manager.bind_to_unique_provider(RecordingProvider::mounted(
            "pinned",
            "axum",
            defaults.starter_options_unique.clone(),
        ));

        let err = manager
            .register(RecordingProvider::mounted(
                "extra",
                "axum",
                defaults.starter_options_unique.clone(),
            ))
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn unregister_is_a_noop_for_unique_managers() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "OptionsManager");
        manager.bind_to_unique_provider(RecordingProvider::mounted(
            "pinned",
            "axum",
            ctx.default_types().starter_options_unique.clone(),
        ));

        manager.unregister("pinned").unwrap();
        assert_eq!(manager.list().len(), 1);
    }

    #[test]
    fn unregister_removes_by_name_otherwise() {
        let ctx = ctx();
        let manager = typed_core(&ctx, "EngineManager");
        manager
            .register(RecordingProvider::mounted(
                "p",
                "axum",
                ctx.default_types().engine_choose.clone(),
            ))
            .unwrap();

        manager.unregister("p").unwrap();
        assert!(manager.list().is_empty());
        assert!(manager.unregister("p").unwrap_err().is_not_found());
    }

    #[test]
    fn set_or_bind_appends_the_delegate_when_mounted() {
        let ctx = ctx();
        let location = ctx.default_locations().engine_create.clone();

        let base = Arc::new(typed_core(&ctx, "EngineManager"));
        let concrete: Arc<dyn ProviderManager> = Arc::new(
            ManagerCore::new(ctx.clone())
                .with_name("EngineManagerSon")
                .with_type(ctx.default_types().engine_choose.clone()),
        );
        base.mount_to_parent(concrete.clone());
        base.clone().set_or_bind_to_location(location.clone(), true);

        let bound = location.managers();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].name(), "EngineManagerSon");
        assert_eq!(base.location().name(), "EngineCreate");
    }

    #[test]
    fn set_or_bind_appends_itself_when_nothing_is_mounted() {
        let ctx = ctx();
        let location = ctx.default_locations().global_init.clone();

        let base = Arc::new(typed_core(&ctx, "Standalone"));
        base.clone().set_or_bind_to_location(location.clone(), true);

        let bound = location.managers();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].name(), "Standalone");
    }
}
