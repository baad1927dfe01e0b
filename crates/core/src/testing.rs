//! In-crate test doubles.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::context::AppContext;
use crate::errors::{CoreError, CoreResult};
use crate::providers::{Provider, ProviderCore, ProviderInitFn, ProviderOutput, ProviderStatus};
use crate::registry::ProviderType;

/// Provider that records how often it was initialized. Returns
/// `"<name>::built"` as its constructed value, or the first init hook's
/// output when one is supplied.
pub(crate) struct RecordingProvider {
    core: ProviderCore,
    runs: AtomicUsize,
    fail: bool,
}

impl RecordingProvider {
    pub(crate) fn mounted(name: &str, target: &str, ptype: ProviderType) -> Arc<Self> {
        Self::build(name, target, ptype, false)
    }

    /// Variant whose initialize always fails, leaving the status untouched.
    pub(crate) fn failing(name: &str, target: &str, ptype: ProviderType) -> Arc<Self> {
        Self::build(name, target, ptype, true)
    }

    fn build(name: &str, target: &str, ptype: ProviderType, fail: bool) -> Arc<Self> {
        let provider = Arc::new(Self {
            core: ProviderCore::new()
                .with_name(name)
                .with_version("0.1.0")
                .with_target(target)
                .with_type(ptype),
            runs: AtomicUsize::new(0),
            fail,
        });
        provider.mount_to_parent(provider.clone());
        provider
    }

    pub(crate) fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Provider for RecordingProvider {
    fn core(&self) -> &ProviderCore {
        &self.core
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn initialize(
        &self,
        _ctx: &AppContext,
        init_fns: &[ProviderInitFn],
    ) -> CoreResult<ProviderOutput> {
        self.check();
        if self.fail {
            return Err(CoreError::configuration(format!(
                "provider '{}' refused to build",
                self.name()
            )));
        }
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.set_status(ProviderStatus::Loaded);
        if let Some(init) = init_fns.first() {
            return init(self);
        }
        Ok(Box::new(format!("{}::built", self.name())))
    }
}
