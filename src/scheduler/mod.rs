//! Per-session polling
//!
//! Each live session gets its own set of poll tasks, one per source kind.
//! Every tick's readings go through the [`Pipeline`]: persist, evaluate
//! alerts, broadcast.

pub mod pipeline;
pub mod poller;
pub mod session;

pub use pipeline::Pipeline;
pub use poller::{PollIntervals, Scheduler, SourcePoller};
pub use session::{SessionId, SessionInfo, SessionLiveness};
