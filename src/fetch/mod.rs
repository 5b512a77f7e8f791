//! Fetchers: one per source kind, all behind the same [`Fetcher`] trait
//!
//! - [`QuoteFetcher`]: batched market quotes over HTTP
//! - [`SyntheticFetcher`]: simulated sensor and weather values
//! - [`HostMetricsFetcher`]: load average and memory utilisation
//! - [`CustomFetcher`]: user-registered HTTP endpoints resolved by JSON path

pub mod custom;
pub mod host;
pub mod json_path;
pub mod quote;
pub mod synthetic;

pub use custom::{CustomFetcher, CustomSourceRegistry, CustomSourceSpec};
pub use host::HostMetricsFetcher;
pub use json_path::{JsonPath, PathError};
pub use quote::QuoteFetcher;
pub use synthetic::SyntheticFetcher;

use async_trait::async_trait;

use crate::data::{Reading, ReadingError};

/// Produces fresh readings for one source kind
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Source tag this fetcher polls, used for logging
    fn source(&self) -> &str;

    /// Fetch one round of readings.
    ///
    /// Each entry is one (source, symbol) outcome; a failure for one
    /// symbol never hides the readings of the others.
    async fn fetch(&self) -> Vec<Result<Reading, FetchError>>;
}

/// Per-fetch failures. All are transient: the reading is skipped for
/// this tick and retried on the next one.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Value at '{path}' is not a number")]
    NonNumeric { path: String },

    #[error("Invalid reading: {0}")]
    Reading(#[from] ReadingError),

    #[error("Host metrics unavailable: {0}")]
    Host(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}
