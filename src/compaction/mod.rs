pub mod ttl;

pub use ttl::{run_retention, RetentionWorker};
