//! Pulseboard: live multi-source stream ingestion and alerting
//!
//! Polls market quotes, simulated sensors and weather, host metrics and
//! user-registered HTTP endpoints while at least one viewer is connected,
//! records every reading, fans readings out to live viewers and fires
//! one-shot threshold alerts.
//!
//! # Features
//!
//! - **Session-Scoped Polling**: one timer per source kind per live connection
//! - **Custom Sources**: any HTTP+JSON endpoint, resolved by a dotted path
//! - **History**: ranged lookups over fixed windows from 30m to 7d
//! - **One-Shot Alerts**: above/below thresholds that fire exactly once
//! - **Retention**: readings older than the longest window are dropped
//!
//! # Example
//!
//! ```no_run
//! use pulseboard::alerts::{AlertRule, Direction};
//! use pulseboard::data::Reading;
//! use pulseboard::storage::{MemoryStore, ReadingStore};
//! use pulseboard::data::HistoryRange;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! store.append(&Reading::new("finance", "AAPL", 201.3)?).await?;
//!
//! let history = store.query("finance", "AAPL", HistoryRange::OneHour).await?;
//! assert_eq!(history.len(), 1);
//!
//! let rule = AlertRule::new("finance", "AAPL", 200.0, Direction::Above);
//! assert!(rule.matches(history[0].value));
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod compaction;
pub mod data;
pub mod fetch;
pub mod hub;
pub mod scheduler;
pub mod storage;

// Re-export commonly used types
pub use alerts::{AlertEvaluator, AlertRule, Direction};
pub use data::{HistoryRange, Reading, ReadingError};
pub use hub::{BroadcastHub, LiveEvent};
pub use scheduler::{Pipeline, Scheduler, SessionId};
pub use storage::{MemoryStore, ReadingStore, StoreError};
