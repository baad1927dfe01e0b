mod store;

pub use store::{GlobalFactory, GlobalHealthCheck, GlobalStore, GlobalValue};
