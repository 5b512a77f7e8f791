//! Store gateway: the append/query contract the pipeline and the
//! history endpoint depend on.

use async_trait::async_trait;

use crate::data::{HistoryRange, Reading};

/// Append-only reading store with ranged lookup
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Record one reading
    async fn append(&self, reading: &Reading) -> Result<(), StoreError>;

    /// All readings for (source, symbol) observed within `range` of now,
    /// ascending by observation time
    async fn query(
        &self,
        source: &str,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<Reading>, StoreError>;

    /// Size counters, if the backend keeps them
    fn stats(&self) -> Option<StoreStats> {
        None
    }
}

/// Store size counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub series_count: usize,
    pub reading_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
