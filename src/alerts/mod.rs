//! One-shot threshold alerts
//!
//! Rules are registered per (source, symbol) from the live channel, checked
//! against every new reading, and removed the moment they fire.

pub mod checker;
pub mod config;
pub mod notifier;
pub mod registry;

pub use checker::AlertEvaluator;
pub use config::{AlertRule, Direction};
pub use notifier::{AlertNotice, LogNotifier, Notifier, NotifierError, WebhookNotifier};
pub use registry::{AlertError, AlertRegistry};
