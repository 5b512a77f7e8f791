use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Identity of one live subscriber connection
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Shared liveness flag of a session.
///
/// Poll tasks hold a clone and check it after every fetch, so results of
/// a fetch that was in flight when the session ended are dropped.
#[derive(Debug, Clone)]
pub struct SessionLiveness(Arc<AtomicBool>);

impl SessionLiveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn end(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Default for SessionLiveness {
    fn default() -> Self {
        Self::new()
    }
}

/// A running session and the poll tasks it owns
pub(crate) struct SessionHandle {
    pub liveness: SessionLiveness,
    pub tasks: Vec<JoinHandle<()>>,
    pub started_at: DateTime<Utc>,
}

impl SessionHandle {
    /// Mark the session ended and cancel its tasks
    pub fn cancel(self) {
        self.liveness.end();
        for task in self.tasks {
            task.abort();
        }
    }
}

/// Public view of a running session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub pollers: usize,
}
