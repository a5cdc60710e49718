//! Session Sweeper Background Job
//!
//! Periodically drops expired entries from one `SessionCache` and publishes
//! the live entry count. One sweeper runs per cache namespace.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::metrics;
use crate::session::SessionCache;

/// `tokio::time::interval` panics on a zero period
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Spawn the sweeper; it exits once `shutdown` flips to `true` or its sender is dropped
pub fn start_session_sweeper(
    cache: Arc<SessionCache>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let namespace = cache.namespace().to_string();
        let every = cache.config().sweep_interval.max(MIN_SWEEP_INTERVAL);
        info!(
            namespace = %namespace,
            interval_secs = every.as_secs(),
            "Starting session sweeper"
        );

        let mut interval = tokio::time::interval(every);
        interval.tick().await; // first tick fires immediately

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(namespace = %namespace, "Session sweeper shutting down");
                        break;
                    }
                }
                _ = interval.tick() => {
                    let removed = cache.sweep();
                    metrics::record_session_evictions(&namespace, removed);
                    metrics::set_session_entries(&namespace, cache.len());
                    debug!(namespace = %namespace, removed, remaining = cache.len(), "Sweep cycle");
                }
            }
        }
    })
}
