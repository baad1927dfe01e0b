mod app;
mod boot;

pub use app::{AppConfig, KeepaliveConfig};
pub use boot::BootConfig;
