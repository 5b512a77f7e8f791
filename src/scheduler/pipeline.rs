use std::sync::Arc;

use futures::future::join_all;

use crate::alerts::AlertEvaluator;
use crate::data::Reading;
use crate::hub::{BroadcastHub, LiveEvent};
use crate::storage::ReadingStore;

/// Delivery path for a fresh reading: persist, check alerts, broadcast
pub struct Pipeline {
    store: Arc<dyn ReadingStore>,
    alerts: Arc<AlertEvaluator>,
    hub: Arc<BroadcastHub>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        alerts: Arc<AlertEvaluator>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self { store, alerts, hub }
    }

    /// Process one reading.
    ///
    /// A failed write is logged and does not stop alert evaluation or
    /// broadcast for the reading.
    pub async fn process(&self, reading: Reading) {
        if let Err(e) = self.store.append(&reading).await {
            tracing::warn!(
                source = %reading.source,
                symbol = %reading.symbol,
                error = %e,
                "Failed to persist reading"
            );
        }

        self.alerts.evaluate(&reading);
        self.hub.publish(LiveEvent::reading_update(&reading));
    }

    /// Process a batch; readings are independent of each other
    pub async fn process_all(&self, readings: Vec<Reading>) {
        join_all(readings.into_iter().map(|r| self.process(r))).await;
    }
}
