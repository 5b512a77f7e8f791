use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source tag for the market quote feed
pub const SOURCE_FINANCE: &str = "finance";
/// Source tag for simulated sensors
pub const SOURCE_SENSOR: &str = "sensor";
/// Source tag for simulated weather stations
pub const SOURCE_WEATHER: &str = "weather";
/// Source tag for host metrics
pub const SOURCE_SYSTEM: &str = "system";

/// One timestamped numeric observation for a (source, symbol) pair.
///
/// Readings can only be built through [`Reading::new`] or [`Reading::at`],
/// which reject non-finite values, so every reading that reaches the store,
/// the alert evaluator or the live channel carries a real number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub source: String,
    pub symbol: String,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

impl Reading {
    /// Create a reading observed now
    pub fn new(
        source: impl Into<String>,
        symbol: impl Into<String>,
        value: f64,
    ) -> Result<Self, ReadingError> {
        Self::at(source, symbol, value, Utc::now())
    }

    /// Create a reading with an explicit observation time
    pub fn at(
        source: impl Into<String>,
        symbol: impl Into<String>,
        value: f64,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, ReadingError> {
        if !value.is_finite() {
            return Err(ReadingError::NonFinite(value));
        }

        Ok(Self {
            source: source.into(),
            symbol: symbol.into(),
            value,
            observed_at,
        })
    }

    /// Key identifying the stream this reading belongs to
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(&self.source, &self.symbol)
    }
}

/// Identity of one stream: a (source, symbol) pair
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct SeriesKey {
    pub source: String,
    pub symbol: String,
}

impl SeriesKey {
    pub fn new(source: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            symbol: symbol.into(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source, self.symbol)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadingError {
    #[error("Reading value {0} is not a finite number")]
    NonFinite(f64),
}
