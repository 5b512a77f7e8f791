//! User-registered HTTP+JSON sources

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use super::json_path::JsonPath;
use super::{FetchError, Fetcher};
use crate::data::Reading;

/// Source tag used in logs for the custom poller
pub const CUSTOM_KIND: &str = "custom";

/// A user-declared (source, symbol) stream read from an HTTP endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomSourceSpec {
    pub source: String,
    pub symbol: String,
    pub url: String,
    #[serde(serialize_with = "serialize_path")]
    pub json_path: JsonPath,
}

fn serialize_path<S: serde::Serializer>(path: &JsonPath, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(path.as_str())
}

impl CustomSourceSpec {
    pub fn new(
        source: impl Into<String>,
        symbol: impl Into<String>,
        url: impl Into<String>,
        json_path: JsonPath,
    ) -> Self {
        Self {
            source: source.into(),
            symbol: symbol.into(),
            url: url.into(),
            json_path,
        }
    }

    /// Build a reading from an already-parsed response body
    pub fn reading_from_body(&self, body: &serde_json::Value) -> Result<Reading, FetchError> {
        let value = self
            .json_path
            .resolve_f64(body)?
            .ok_or_else(|| FetchError::NonNumeric {
                path: self.json_path.to_string(),
            })?;

        Ok(Reading::new(&self.source, &self.symbol, value)?)
    }
}

/// Process-wide list of custom sources. Entries are only ever added.
pub struct CustomSourceRegistry {
    specs: RwLock<Vec<CustomSourceSpec>>,
}

impl CustomSourceRegistry {
    pub fn new() -> Self {
        Self {
            specs: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, spec: CustomSourceSpec) {
        tracing::info!(
            source = %spec.source,
            symbol = %spec.symbol,
            url = %spec.url,
            path = %spec.json_path,
            "Custom source registered"
        );
        self.specs.write().push(spec);
    }

    /// Copy of the current entries
    pub fn snapshot(&self) -> Vec<CustomSourceSpec> {
        self.specs.read().clone()
    }

    pub fn len(&self) -> usize {
        self.specs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.read().is_empty()
    }
}

impl Default for CustomSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls every registered custom source, one request per source
pub struct CustomFetcher {
    client: reqwest::Client,
    registry: Arc<CustomSourceRegistry>,
}

impl CustomFetcher {
    pub fn new(client: reqwest::Client, registry: Arc<CustomSourceRegistry>) -> Self {
        Self { client, registry }
    }

    async fn fetch_one(&self, spec: &CustomSourceSpec) -> Result<Reading, FetchError> {
        let body: serde_json::Value = self
            .client
            .get(&spec.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        spec.reading_from_body(&body)
    }
}

#[async_trait]
impl Fetcher for CustomFetcher {
    fn source(&self) -> &str {
        CUSTOM_KIND
    }

    async fn fetch(&self) -> Vec<Result<Reading, FetchError>> {
        // Sources registered after this point are picked up next tick
        let specs = self.registry.snapshot();
        join_all(specs.iter().map(|spec| self.fetch_one(spec))).await
    }
}
