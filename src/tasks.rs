use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::engine::Engine;

// The two recurring engine processes: view advancement (~5s) and aggregate
// stats resync (~30s). Both are idempotent within a tick, so a missed or
// doubled interval is harmless.
pub fn spawn_background_tasks(engine: Arc<Engine>) -> Vec<JoinHandle<()>> {
    let ticks = engine.config().ticks.clone();

    let view_engine = engine.clone();
    let view_task = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(ticks.view_interval_secs.max(1)));
        loop {
            interval.tick().await;
            match view_engine.tick_views().await {
                Ok(updated) if updated > 0 => debug!(updated, "advanced post views"),
                Ok(_) => {}
                Err(err) => error!(%err, "view tick failed"),
            }
        }
    });

    let stats_engine = engine;
    let stats_task = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(ticks.stats_interval_secs.max(1)));
        loop {
            interval.tick().await;
            match stats_engine.resync_stats().await {
                Ok(updated) if updated > 0 => debug!(updated, "resynced user stats"),
                Ok(_) => {}
                Err(err) => error!(%err, "stats resync failed"),
            }
        }
    });

    vec![view_task, stats_task]
}
