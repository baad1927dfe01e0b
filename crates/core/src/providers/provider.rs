use std::any::Any;
use std::sync::{Arc, OnceLock, RwLock};

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::ProviderManager;
use crate::registry::ProviderType;

/// Value constructed by a provider run.
pub type ProviderOutput = Box<dyn Any + Send + Sync>;

/// Caller-supplied hook handed to `Provider::initialize`. Concrete providers
/// use it to pull construction options from the invoking manager.
pub type ProviderInitFn = Box<dyn Fn(&dyn Provider) -> CoreResult<ProviderOutput> + Send + Sync>;

/// Load state of a provider. One-way and terminal: a provider leaves
/// `Unloaded` at most once, and a failed initialize leaves it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatus {
    Unloaded,
    Loaded,
}

/// Capability contract for a pluggable unit that produces one constructed
/// value on demand.
///
/// Concrete providers compose a [`ProviderCore`] and get the shared behavior
/// from the default methods; they override `initialize` with the actual
/// construction. The core's delegate slot is what lets code holding only a
/// base-typed handle reach the concrete override.
pub trait Provider: Send + Sync {
    /// Shared provider state.
    fn core(&self) -> &ProviderCore;

    /// `Any` view of the concrete instance, for downcasting.
    fn as_any(&self) -> &dyn Any;

    fn name(&self) -> &str {
        self.core().name()
    }

    fn version(&self) -> &str {
        self.core().version()
    }

    /// Discriminator matched against boot selectors by Choose/Type policies,
    /// e.g. an engine or codec name.
    fn target(&self) -> &str {
        self.core().target()
    }

    fn provider_type(&self) -> ProviderType {
        self.core().provider_type()
    }

    fn status(&self) -> ProviderStatus {
        self.core().status()
    }

    /// One-shot: the first call wins and later calls are silently ignored.
    fn set_status(&self, status: ProviderStatus) {
        self.core().set_status(status);
    }

    /// Panics when the provider type was never set. Concrete `initialize`
    /// implementations call this first so a wiring mistake surfaces before
    /// any side effect.
    fn check(&self) {
        self.core().ensure_type_set();
    }

    /// Produce the provider's constructed value.
    ///
    /// The base behavior forwards to the mounted delegate after `check`. A
    /// provider that never mounted one fails with an explicit delegation
    /// error and executes nothing.
    fn initialize(
        &self,
        ctx: &AppContext,
        init_fns: &[ProviderInitFn],
    ) -> CoreResult<ProviderOutput> {
        self.check();
        let delegate = self.core().forward_target()?;
        delegate.initialize(ctx, init_fns)
    }

    /// Register this provider with `manager`.
    ///
    /// What gets registered is the mounted delegate, never the base, so the
    /// manager resolves the concrete override even through a base handle.
    fn register_to(&self, manager: &dyn ProviderManager) -> CoreResult<()> {
        let delegate = self.core().forward_target()?;
        manager.register(delegate)
    }

    /// Attach the concrete instance this provider's base forwards to.
    /// Mounting the base onto itself aborts.
    fn mount_to_parent(&self, delegate: Arc<dyn Provider>) {
        self.core().mount(delegate);
    }

    /// Cross-link this provider and `manager` so the manager accepts exactly
    /// one provider for the rest of its life. The mounted delegate is what
    /// gets bound; the manager should be a singleton in the wiring.
    fn bind_to_unique_manager(&self, manager: &dyn ProviderManager) -> CoreResult<()> {
        let delegate = self.core().forward_target()?;
        manager.bind_to_unique_provider(delegate);
        Ok(())
    }
}

/// Composed base state shared by every provider: identity, target, one-shot
/// status and type, and the delegate slot.
///
/// Not designed for concurrent mutation after startup. Wiring happens
/// single-threaded; once serving begins the struct is read-only apart from
/// the one-shot status flip.
pub struct ProviderCore {
    name: String,
    version: String,
    target: String,
    status: OnceLock<ProviderStatus>,
    ptype: OnceLock<ProviderType>,
    delegate: RwLock<Option<Arc<dyn Provider>>>,
}

impl ProviderCore {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            target: String::new(),
            status: OnceLock::new(),
            ptype: OnceLock::new(),
            delegate: RwLock::new(None),
        }
    }

    /// Set the provider name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the provider version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the target discriminator
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the provider type. One-shot like `set_type`.
    pub fn with_type(self, ptype: ProviderType) -> Self {
        let _ = self.ptype.set(ptype);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Current status; `Unloaded` until the one-shot set happens.
    pub fn status(&self) -> ProviderStatus {
        self.status
            .get()
            .copied()
            .unwrap_or(ProviderStatus::Unloaded)
    }

    /// One-shot status set; the first call wins.
    pub fn set_status(&self, status: ProviderStatus) {
        let _ = self.status.set(status);
    }

    /// Classification, or the zero sentinel when never set.
    pub fn provider_type(&self) -> ProviderType {
        self.ptype.get().cloned().unwrap_or_else(ProviderType::zero)
    }

    /// One-shot type set; the first call wins.
    pub fn set_type(&self, ptype: ProviderType) {
        let _ = self.ptype.set(ptype);
    }

    /// Abort when the type is still the zero sentinel.
    pub fn ensure_type_set(&self) {
        if self.provider_type().is_zero() {
            panic!("provider '{}' type is not set", self.name);
        }
    }

    /// Mounted delegate, if any.
    pub fn delegate(&self) -> Option<Arc<dyn Provider>> {
        self.delegate
            .read()
            .ok()
            .and_then(|slot| slot.clone())
    }

    /// Delegate to forward to, or the delegation error describing what is
    /// missing. The self check is unreachable through `mount` and guards
    /// direct slot misuse.
    pub(crate) fn forward_target(&self) -> CoreResult<Arc<dyn Provider>> {
        let delegate = self
            .delegate()
            .ok_or_else(|| CoreError::delegate_not_mounted(self.name.as_str()))?;
        if let Some(base) = delegate.as_any().downcast_ref::<ProviderCore>() {
            if std::ptr::eq(base, self) {
                return Err(CoreError::self_delegation(self.name.as_str()));
            }
        }
        Ok(delegate)
    }

    /// Mount the concrete instance this core forwards to.
    ///
    /// Mounting the core onto itself aborts: base forwarding would loop
    /// forever. A concrete provider wrapping this core is fine.
    pub fn mount(&self, delegate: Arc<dyn Provider>) {
        if let Some(base) = delegate.as_any().downcast_ref::<ProviderCore>() {
            if std::ptr::eq(base, self) {
                panic!(
                    "provider '{}': delegate cannot be the base instance itself",
                    self.name
                );
            }
        }
        if let Ok(mut slot) = self.delegate.write() {
            *slot = Some(delegate);
        }
    }
}

impl Default for ProviderCore {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for ProviderCore {
    fn core(&self) -> &ProviderCore {
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

    #[test]
    fn status_is_immutable_once_set() {
        let core = ProviderCore::new().with_name("p");
        assert_eq!(core.status(), ProviderStatus::Unloaded);

        core.set_status(ProviderStatus::Loaded);
        assert_eq!(core.status(), ProviderStatus::Loaded);

        // a later set with a different value does not change the observed status
        core.set_status(ProviderStatus::Unloaded);
        assert_eq!(core.status(), ProviderStatus::Loaded);
    }

    #[test]
    fn type_is_immutable_once_set() {
        let ctx = ctx();
        let defaults = ctx.default_types();
        let core = ProviderCore::new().with_type(defaults.engine_choose.clone());

        core.set_type(defaults.codec_choose.clone());
        assert_eq!(core.provider_type(), defaults.engine_choose);
    }

    #[test]
    fn initialize_without_a_delegate_fails_and_runs_nothing() {
        let ctx = ctx();
        let base = ProviderCore::new()
            .with_name("bare")
            .with_type(ctx.default_types().engine_choose.clone());

        let err = base.initialize(&ctx, &[]).unwrap_err();
        assert!(err.is_delegation());
        assert_eq!(base.status(), ProviderStatus::Unloaded);
    }

    #[test]
    #[should_panic(expected = "type is not set")]
    fn check_aborts_when_the_type_was_never_set() {
        let core = ProviderCore::new().with_name("untyped");
        core.check();
    }

    #[test]
    #[should_panic(expected = "delegate cannot be the base instance itself")]
    fn mounting_the_base_onto_itself_aborts() {
        let base = Arc::new(ProviderCore::new().with_name("base"));
        base.mount_to_parent(base.clone());
    }

    #[test]
    fn initialize_through_the_base_reaches_the_delegate() {
        let ctx = ctx();
        let concrete = RecordingProvider::mounted(
            "engine-axum",
            "axum",
            ctx.default_types().engine_choose.clone(),
        );

        let base = ProviderCore::new()
            .with_name("handle")
            .with_type(ctx.default_types().engine_choose.clone());
        base.mount(concrete.clone());

        base.initialize(&ctx, &[]).unwrap();
        assert_eq!(concrete.run_count(), 1);
        assert_eq!(concrete.status(), ProviderStatus::Loaded);
    }

    #[test]
    fn register_to_registers_the_delegate_not_the_base() {
        let ctx = ctx();
        let defaults = ctx.default_types();
        let concrete =
            RecordingProvider::mounted("engine-axum", "axum", defaults.engine_choose.clone());

        let base = ProviderCore::new()
            .with_name("handle")
            .with_type(defaults.engine_choose.clone());
        base.mount(concrete.clone());

        let manager = Arc::new(
            crate::providers::ManagerCore::new(ctx.clone())
                .with_name("EngineManager")
                .with_type(defaults.engine_choose.clone()),
        );
        base.register_to(manager.as_ref()).unwrap();

        let registered = manager.get_provider("engine-axum").unwrap();
        assert_eq!(registered.name(), "engine-axum");
    }

    #[test]
    fn register_to_without_a_delegate_is_a_delegation_error() {
        let ctx = ctx();
        let defaults = ctx.default_types();
        let base = ProviderCore::new()
            .with_name("handle")
            .with_type(defaults.engine_choose.clone());
        let manager = Arc::new(
            crate::providers::ManagerCore::new(ctx.clone())
                .with_name("EngineManager")
                .with_type(defaults.engine_choose.clone()),
        );

        assert!(base.register_to(manager.as_ref()).unwrap_err().is_delegation());
        assert!(manager.list().is_empty());
    }

    #[test]
    fn failed_initialize_leaves_the_provider_unloaded() {
        let ctx = ctx();
        let failing = RecordingProvider::failing(
            "engine-broken",
            "axum",
            ctx.default_types().engine_choose.clone(),
        );

        assert!(failing.initialize(&ctx, &[]).is_err());
        assert_eq!(failing.status(), ProviderStatus::Unloaded);
    }

    #[test]
    fn init_fns_feed_the_concrete_provider() {
        let ctx = ctx();
        let concrete = RecordingProvider::mounted(
            "starter",
            "axum",
            ctx.default_types().starter_choose.clone(),
        );

        let opts: ProviderInitFn =
            Box::new(|provider| Ok(Box::new(format!("opts-for-{}", provider.name()))));
        let output = concrete.initialize(&ctx, &[opts]).unwrap();
        let output = output.downcast::<String>().unwrap();
        assert_eq!(*output, "opts-for-starter");
    }
}
