use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::pipeline::Pipeline;
use super::session::{SessionHandle, SessionId, SessionInfo, SessionLiveness};
use crate::fetch::Fetcher;

/// Poll interval per built-in source kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollIntervals {
    pub finance: Duration,
    pub sensor: Duration,
    pub weather: Duration,
    pub system: Duration,
    pub custom: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            finance: Duration::from_secs(5),
            sensor: Duration::from_secs(7),
            weather: Duration::from_secs(10),
            system: Duration::from_secs(6),
            custom: Duration::from_secs(8),
        }
    }
}

/// A fetcher and how often to run it
#[derive(Clone)]
pub struct SourcePoller {
    pub fetcher: Arc<dyn Fetcher>,
    pub interval: Duration,
}

/// Runs one recurring poll task per source kind for every live session
pub struct Scheduler {
    pollers: Vec<SourcePoller>,
    pipeline: Arc<Pipeline>,
    sessions: DashMap<SessionId, SessionHandle>,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pollers: Vec::new(),
            pipeline,
            sessions: DashMap::new(),
        }
    }

    /// Add a poller. Applies to sessions started afterwards.
    pub fn with_poller(mut self, fetcher: Arc<dyn Fetcher>, interval: Duration) -> Self {
        self.pollers.push(SourcePoller {
            fetcher,
            interval: interval.max(Duration::from_millis(1)),
        });
        self
    }

    /// Start polling on behalf of a new session
    pub fn start_session(&self) -> SessionId {
        let id = SessionId::new();
        let liveness = SessionLiveness::new();

        let tasks = self
            .pollers
            .iter()
            .map(|poller| {
                tokio::spawn(poll_loop(
                    poller.clone(),
                    Arc::clone(&self.pipeline),
                    liveness.clone(),
                    id.clone(),
                ))
            })
            .collect();

        self.sessions.insert(
            id.clone(),
            SessionHandle {
                liveness,
                tasks,
                started_at: chrono::Utc::now(),
            },
        );

        tracing::info!(session_id = %id, pollers = self.pollers.len(), "Session started");
        id
    }

    /// Stop every poll task of a session.
    /// Returns false if the session was not running.
    pub fn end_session(&self, id: &SessionId) -> bool {
        match self.sessions.remove(id) {
            Some((_, handle)) => {
                handle.cancel();
                tracing::info!(session_id = %id, "Session ended");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        self.sessions
            .iter()
            .map(|e| SessionInfo {
                id: e.key().clone(),
                started_at: e.value().started_at,
                pollers: e.value().tasks.len(),
            })
            .collect()
    }

    /// End every session. Returns how many were running.
    pub fn shutdown(&self) -> usize {
        let ids: Vec<SessionId> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter(|id| self.end_session(id)).count()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One poller's loop for one session.
///
/// The first fetch happens one full interval after start. A failed fetch
/// is logged and skipped until the next tick.
async fn poll_loop(
    poller: SourcePoller,
    pipeline: Arc<Pipeline>,
    liveness: SessionLiveness,
    session_id: SessionId,
) {
    let source = poller.fetcher.source().to_string();
    let mut ticker = time::interval_at(Instant::now() + poller.interval, poller.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !liveness.is_active() {
            break;
        }

        let results = poller.fetcher.fetch().await;
        if !liveness.is_active() {
            tracing::debug!(session_id = %session_id, source = %source, "Discarding fetch for ended session");
            break;
        }

        let mut readings = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        source = %source,
                        error = %e,
                        "Fetch failed"
                    );
                }
            }
        }

        pipeline.process_all(readings).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertEvaluator, AlertRegistry, LogNotifier};
    use crate::data::Reading;
    use crate::fetch::{FetchError, SyntheticFetcher};
    use crate::hub::{BroadcastHub, LiveEvent};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts fetches and returns one failure plus one reading
    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        fn source(&self) -> &str {
            "test"
        }

        async fn fetch(&self) -> Vec<Result<Reading, FetchError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            vec![
                Err(FetchError::Network("connection reset".to_string())),
                Reading::new("test", "counter", 1.0).map_err(FetchError::from),
            ]
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        hub: Arc<BroadcastHub>,
        pipeline: Arc<Pipeline>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let hub = Arc::new(BroadcastHub::default());
        let alerts = Arc::new(AlertEvaluator::new(
            Arc::new(AlertRegistry::new()),
            Arc::new(LogNotifier),
            Arc::clone(&hub),
        ));
        let pipeline = Arc::new(Pipeline::new(store.clone(), alerts, Arc::clone(&hub)));
        Fixture {
            store,
            hub,
            pipeline,
        }
    }

    #[test]
    fn test_default_intervals() {
        let intervals = PollIntervals::default();
        assert_eq!(intervals.finance, Duration::from_secs(5));
        assert_eq!(intervals.sensor, Duration::from_secs(7));
        assert_eq!(intervals.weather, Duration::from_secs(10));
        assert_eq!(intervals.system, Duration::from_secs(6));
        assert_eq!(intervals.custom, Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_session_polls_and_skips_failures() {
        let fx = fixture();
        let fetcher = Arc::new(CountingFetcher::default());
        let scheduler = Scheduler::new(Arc::clone(&fx.pipeline))
            .with_poller(fetcher.clone(), Duration::from_millis(20));

        let id = scheduler.start_session();
        assert!(scheduler.is_active(&id));
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.end_session(&id);

        let calls = fetcher.calls.load(Ordering::SeqCst);
        assert!(calls >= 2, "expected several ticks, got {}", calls);

        // Each tick stored exactly its one good reading
        assert_eq!(fx.store.stats().reading_count, calls);
    }

    #[tokio::test]
    async fn test_end_session_stops_polling() {
        let fx = fixture();
        let fetcher = Arc::new(CountingFetcher::default());
        let scheduler = Scheduler::new(Arc::clone(&fx.pipeline))
            .with_poller(fetcher.clone(), Duration::from_millis(10));

        let id = scheduler.start_session();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(scheduler.end_session(&id));
        assert!(!scheduler.end_session(&id));
        assert_eq!(scheduler.session_count(), 0);

        let calls_at_end = fetcher.calls.load(Ordering::SeqCst);
        let stored_at_end = fx.store.stats().reading_count;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls_at_end);
        assert_eq!(fx.store.stats().reading_count, stored_at_end);
    }

    #[tokio::test]
    async fn test_in_flight_fetch_discarded_after_end() {
        let fx = fixture();
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            delay: Some(Duration::from_millis(100)),
        });
        let scheduler = Scheduler::new(Arc::clone(&fx.pipeline))
            .with_poller(fetcher.clone(), Duration::from_millis(10));

        let id = scheduler.start_session();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        scheduler.end_session(&id);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(fx.store.stats().reading_count, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let fx = fixture();
        let fetcher = Arc::new(CountingFetcher::default());
        let scheduler = Scheduler::new(Arc::clone(&fx.pipeline))
            .with_poller(fetcher.clone(), Duration::from_millis(10));

        let a = scheduler.start_session();
        let b = scheduler.start_session();
        assert_eq!(scheduler.session_count(), 2);

        scheduler.end_session(&a);
        assert!(scheduler.is_active(&b));

        let before = fetcher.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(fetcher.calls.load(Ordering::SeqCst) > before);

        assert_eq!(scheduler.shutdown(), 1);
        assert_eq!(scheduler.session_count(), 0);
    }

    #[tokio::test]
    async fn test_readings_reach_viewers() {
        let fx = fixture();
        let mut viewer = fx.hub.subscribe();
        let scheduler = Scheduler::new(Arc::clone(&fx.pipeline))
            .with_poller(Arc::new(SyntheticFetcher::sensors()), Duration::from_millis(10));

        let id = scheduler.start_session();
        let event = tokio::time::timeout(Duration::from_secs(2), viewer.recv())
            .await
            .expect("no event within timeout")
            .unwrap();
        scheduler.end_session(&id);

        match event {
            LiveEvent::ReadingUpdate(update) => assert_eq!(update.source, "sensor"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
