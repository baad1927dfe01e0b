mod autorun;
mod codec;
mod default;
mod engine;
mod middleware;
mod options;

pub use autorun::GlobalInitManager;
pub use codec::CodecManager;
pub use default::DefaultManager;
pub use engine::EngineManager;
pub use middleware::MiddlewareManager;
pub use options::StarterOptionsManager;
