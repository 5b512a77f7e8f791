//! Live fan-out of readings and fired alerts to every connected viewer

pub mod broadcast;
pub mod events;

pub use broadcast::BroadcastHub;
pub use events::{AlertFired, ClientEvent, LiveEvent, ReadingUpdate, RegisterAlert};
