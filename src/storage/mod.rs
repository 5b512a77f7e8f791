pub mod engine;
pub mod store;

pub use engine::MemoryStore;
pub use store::{ReadingStore, StoreError, StoreStats};
