use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::container::GlobalStore;
use crate::context::AppContext;

/// Start the background global-object keepalive supervisor, if enabled by
/// configuration.
///
/// The task wakes on a fixed interval, walks every store entry, health-checks
/// it, and rebuilds unhealthy ones. It is the only actor that calls `rebuild`
/// after startup and it runs until process exit; the returned handle is the
/// caller's only shutdown lever.
pub fn spawn_keepalive(ctx: &Arc<AppContext>) -> Option<JoinHandle<()>> {
    let keepalive = &ctx.config().keepalive;
    if !keepalive.enabled {
        return None;
    }

    let interval = Duration::from_secs(keepalive.interval_secs.max(1));
    let store = ctx.store().clone();
    info!("starting global object keepalive, interval {:?}", interval);

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick of a tokio interval completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep(&store);
        }
    }))
}

/// One health pass over the store. Every failure inside the loop body is
/// logged and contained so a broken entry can never take the supervisor down.
fn sweep(store: &GlobalStore) {
    store.range(|key, _value| {
        match store.check_health(key) {
            Err(err) => {
                error!("health check for global object '{}' failed: {}", key, err);
            }
            Ok(true) => {}
            Ok(false) => {
                error!("global object '{}' is unhealthy, rebuilding", key);
                if let Err(err) = store.rebuild(key) {
                    error!("rebuild of global object '{}' failed: {}", key, err);
                }
            }
        }
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::container::GlobalValue;
    use crate::errors::CoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn sweep_rebuilds_unhealthy_entries() {
        let store = GlobalStore::new();
        let builds = Arc::new(AtomicUsize::new(0));
        let factory_builds = builds.clone();
        store.register_with_health(
            "conn",
            move || {
                let generation = factory_builds.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(Arc::new(generation) as GlobalValue)
            },
            // only the first build is unhealthy
            |value| Ok(value.downcast_ref::<usize>() != Some(&1)),
        );
        store.get("conn").unwrap();

        sweep(&store);
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(*store.get_as::<usize>("conn").unwrap(), 2);

        // healthy now, so another pass rebuilds nothing
        sweep(&store);
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sweep_survives_failing_health_checks_and_rebuilds() {
        let store = GlobalStore::new();
        store.register_with_health(
            "flaky-check",
            || Ok(Arc::new(1_u8) as GlobalValue),
            |_| Err(CoreError::configuration("probe exploded")),
        );
        let factory_calls = Arc::new(AtomicUsize::new(0));
        let calls = factory_calls.clone();
        store.register_with_health(
            "broken-factory",
            move || {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(Arc::new(9_u8) as GlobalValue)
                } else {
                    Err(CoreError::configuration("cannot rebuild"))
                }
            },
            |_| Ok(false),
        );
        store.register_with_health(
            "healthy",
            || Ok(Arc::new(2_u8) as GlobalValue),
            |_| Ok(true),
        );
        store.get("flaky-check").unwrap();
        store.get("broken-factory").unwrap();
        store.get("healthy").unwrap();

        // must not panic or stop at the failing entries
        sweep(&store);
        assert_eq!(factory_calls.load(Ordering::SeqCst), 2);
        assert!(store.check_health("healthy").unwrap());
    }

    #[tokio::test]
    async fn spawn_is_gated_on_configuration() {
        let ctx = AppContext::new(AppConfig::default());
        assert!(spawn_keepalive(&ctx).is_none());

        let mut config = AppConfig::default();
        config.keepalive.enabled = true;
        config.keepalive.interval_secs = 1;
        let ctx = AppContext::new(config);
        let handle = spawn_keepalive(&ctx).expect("supervisor should start");
        handle.abort();
    }
}
