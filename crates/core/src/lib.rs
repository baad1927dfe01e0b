//! Bootstrap-resolution core for the keel framework.
//!
//! Services are assembled from independently developed, swappable parts:
//! typed, versioned providers produce constructed values; managers own one
//! typed group of providers each and resolve which of them run against the
//! boot configuration; locations order the managers along the bootstrap
//! sequence; and a supervised global store holds the constructed singletons.

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod container;
pub mod context;
pub mod errors;
pub mod keepalive;
pub mod managers;
pub mod providers;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenience
pub use bootstrap::Rig;
pub use config::{AppConfig, BootConfig, KeepaliveConfig};
pub use container::{GlobalStore, GlobalValue};
pub use context::{AppContext, Storage};
pub use errors::{CoreError, CoreResult};
pub use keepalive::spawn_keepalive;
pub use managers::{
    CodecManager, DefaultManager, EngineManager, GlobalInitManager, MiddlewareManager,
    StarterOptionsManager,
};
pub use providers::{
    ManagerCore, Provider, ProviderCore, ProviderInitFn, ProviderLoadFn, ProviderManager,
    ProviderOutput, ProviderStatus,
};
pub use registry::{
    DefaultLocations, DefaultTypes, LocationRegistry, ProviderLocation, ProviderType, TypeRegistry,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "keel";

/// Get framework version
pub fn version() -> &'static str {
    VERSION
}

/// Get framework name
pub fn name() -> &'static str {
    FRAMEWORK_NAME
}
