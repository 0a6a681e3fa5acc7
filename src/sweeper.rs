//! Background removal of expired cache entries

use crate::cache::CacheStore;
use crate::Result;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Sweep once on the blocking pool, returning the number of removed entries
pub async fn sweep_once(store: &CacheStore) -> Result<usize> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || store.sweep_expired()).await?
}

/// Sweep at startup; a failure is logged and the server starts anyway
pub async fn run_startup_sweep(store: &CacheStore) -> usize {
    match sweep_once(store).await {
        Ok(removed) => {
            tracing::info!(removed = removed, "Startup sweep complete");
            removed
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup sweep failed");
            0
        }
    }
}

/// Sweep every `interval` until `shutdown` turns true or its sender is dropped
pub fn spawn(store: CacheStore, interval: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the startup sweep covers it
        ticker.tick().await;

        tracing::debug!(interval_secs = interval.as_secs(), "Sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = sweep_once(&store).await {
                        tracing::error!(error = %e, "Periodic sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Sweeper stopping");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, ManualClock};
    use chrono::Utc;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn create_store() -> (CacheStore, Arc<ManualClock>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = CacheStore::with_clock(
            CacheConfig {
                path: temp_dir.path().join("cache.db"),
                ..Default::default()
            },
            clock.clone(),
        )
        .unwrap();
        (store, clock, temp_dir)
    }

    #[tokio::test]
    async fn test_startup_sweep_removes_expired() {
        let (store, clock, _temp) = create_store();
        store.put("old", &"value", Duration::from_secs(5));
        store.put("new", &"value", Duration::from_secs(3600));

        clock.advance(chrono::Duration::seconds(10));
        assert_eq!(run_startup_sweep(&store).await, 1);
        assert!(!store.contains("old").unwrap());
        assert!(store.contains("new").unwrap());
    }

    #[tokio::test]
    async fn test_periodic_sweep_and_shutdown() {
        let (store, clock, _temp) = create_store();
        store.put("old", &"value", Duration::from_secs(5));
        clock.advance(chrono::Duration::seconds(10));

        let (tx, rx) = watch::channel(false);
        let handle = spawn(store.clone(), Duration::from_millis(10), rx);

        let mut swept = false;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if !store.contains("old").unwrap() {
                swept = true;
                break;
            }
        }
        assert!(swept);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
