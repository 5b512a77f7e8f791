use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::events::LiveEvent;

/// Default buffer capacity for the broadcast channel
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out hub for live events
///
/// Every subscriber holds its own receiver, so joining and leaving never
/// touch a shared lock. Publishing with no subscribers is a no-op. A
/// subscriber that falls more than the channel capacity behind skips the
/// events it missed.
pub struct BroadcastHub {
    sender: broadcast::Sender<LiveEvent>,
    published: AtomicU64,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Deliver an event to every current subscriber.
    /// Returns the number of subscribers it was handed to.
    pub fn publish(&self, event: LiveEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        // An error only means there are no subscribers right now
        self.sender.send(event).unwrap_or(0)
    }

    /// Join the hub
    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total events published since start
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
