//! Alert rule types

use serde::{Deserialize, Serialize};

use crate::data::SeriesKey;

/// Which side of the threshold triggers a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Trigger when value >= threshold
    Above,
    /// Trigger when value <= threshold
    Below,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot threshold rule on a (source, symbol) stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub source: String,
    pub symbol: String,
    pub threshold: f64,
    pub direction: Direction,
    /// Where to send a notification when the rule fires
    #[serde(default)]
    pub notify_address: Option<String>,
}

impl AlertRule {
    pub fn new(
        source: impl Into<String>,
        symbol: impl Into<String>,
        threshold: f64,
        direction: Direction,
    ) -> Self {
        Self {
            source: source.into(),
            symbol: symbol.into(),
            threshold,
            direction,
            notify_address: None,
        }
    }

    /// Set notification address
    pub fn with_notify_address(mut self, address: impl Into<String>) -> Self {
        self.notify_address = Some(address.into());
        self
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(&self.source, &self.symbol)
    }

    /// Whether a value satisfies this rule
    pub fn matches(&self, value: f64) -> bool {
        match self.direction {
            Direction::Above => value >= self.threshold,
            Direction::Below => value <= self.threshold,
        }
    }

    /// Human-readable description used in notifications
    pub fn describe(&self, value: f64) -> String {
        format!(
            "{}/{} = {} is {} threshold {}",
            self.source, self.symbol, value, self.direction, self.threshold
        )
    }
}
