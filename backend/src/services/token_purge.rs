//! Background job: delete expired bearer tokens.
//!
//! Lookups already ignore expired rows; this only keeps the table small.

use crate::auth::store::TokenStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

/// Spawn the purge task. Call this once at startup.
pub fn spawn(store: Arc<dyn TokenStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            run_once(store.as_ref()).await;
        }
    })
}

async fn run_once(store: &dyn TokenStore) {
    match store.purge_expired().await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "purged expired bearer tokens"),
        Err(e) => tracing::error!("token purge failed: {}", e),
    }
}
