use crate::storage::MemoryStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Retention worker that periodically drops readings older than the
/// configured retention period
pub struct RetentionWorker {
    store: Arc<MemoryStore>,
    retention: Duration,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl RetentionWorker {
    pub fn new(store: Arc<MemoryStore>, retention: Duration, interval: Duration) -> Self {
        Self {
            store,
            retention,
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background worker
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            tracing::info!(
                "Retention worker started with interval {:?}, retention {:?}",
                self.interval,
                self.retention
            );

            let mut interval = time::interval(self.interval);

            while self.running.load(Ordering::SeqCst) {
                interval.tick().await;

                let expired = run_retention(&self.store, self.retention);
                if expired > 0 {
                    tracing::info!("Retention worker expired {} readings", expired);
                }
            }

            tracing::info!("Retention worker stopped");
        })
    }

    /// Stop the worker
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if worker is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Run one retention pass against the store
pub fn run_retention(store: &MemoryStore, retention: Duration) -> usize {
    let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
    let cutoff = chrono::Utc::now()
        .checked_sub_signed(retention)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
    store.expire_before(cutoff)
}
