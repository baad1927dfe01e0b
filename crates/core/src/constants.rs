//! Shared names and defaults used across the bootstrap core.

/// Key prefix for general objects published to the global store.
pub const REGISTER_KEY_PREFIX: &str = "__key_";

/// Key prefix for context handles in the global store.
pub const CONTEXT_KEY_PREFIX: &str = "__ctx_";

/// Key prefix for per-origin loggers in the global store.
pub const LOG_ORIGIN_KEY_PREFIX: &str = "__log_origin_";

/// Global store key under which the wiring publishes the application context.
pub const GLOBAL_APP_CONTEXT_KEY: &str = "__ctx_app_context";

/// Engine selector values understood by the default wiring.
pub const ENGINE_AXUM: &str = "axum";
pub const ENGINE_ACTIX: &str = "actix";

/// Engine used when the boot selector is left empty.
pub const DEFAULT_ENGINE: &str = ENGINE_AXUM;

/// Codec selector values understood by the default wiring.
pub const CODEC_SERDE_JSON: &str = "serde-json";
pub const CODEC_SIMD_JSON: &str = "simd-json";

/// Default keepalive sweep interval, in seconds.
pub const DEFAULT_KEEPALIVE_SECS: u64 = 180;
