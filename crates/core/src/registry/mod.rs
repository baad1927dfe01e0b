mod locations;
mod types;

pub use locations::{DefaultLocations, LocationRegistry, ProviderLocation};
pub use types::{DefaultTypes, ProviderType, TypeRegistry};

/// Reserved id range shared by the type and location registries.
pub const DEFAULT_RANGE_START: u8 = 0;
pub const DEFAULT_RANGE_END: u8 = 63;

/// Open id range for application-defined types and locations.
pub const CUSTOM_RANGE_START: u8 = 64;
pub const CUSTOM_RANGE_END: u8 = 255;

/// Name of the reserved zero entry both registries allocate first. Id 0 is
/// the "not yet classified" sentinel checked by `check` on providers and
/// managers.
pub const RESERVED_ZERO_NAME: &str = "__unset__";
