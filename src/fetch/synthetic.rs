//! Simulated sources: values drawn uniformly from fixed per-symbol ranges

use async_trait::async_trait;
use rand::Rng;

use super::{FetchError, Fetcher};
use crate::data::{Reading, SOURCE_SENSOR, SOURCE_WEATHER};

/// Inclusive value range for one simulated symbol
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolRange {
    pub symbol: String,
    pub min: f64,
    pub max: f64,
}

impl SymbolRange {
    pub fn new(symbol: impl Into<String>, min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            symbol: symbol.into(),
            min,
            max,
        }
    }
}

/// Fetcher that never touches the network and never fails
pub struct SyntheticFetcher {
    source: String,
    ranges: Vec<SymbolRange>,
}

impl SyntheticFetcher {
    pub fn new(source: impl Into<String>, ranges: Vec<SymbolRange>) -> Self {
        Self {
            source: source.into(),
            ranges,
        }
    }

    /// Simulated environmental sensors
    pub fn sensors() -> Self {
        Self::new(
            SOURCE_SENSOR,
            vec![
                SymbolRange::new("temperature", 18.0, 30.0),
                SymbolRange::new("humidity", 30.0, 70.0),
                SymbolRange::new("pressure", 980.0, 1040.0),
            ],
        )
    }

    /// Simulated city temperatures in degrees Celsius
    pub fn weather() -> Self {
        Self::new(
            SOURCE_WEATHER,
            vec![
                SymbolRange::new("london", 2.0, 22.0),
                SymbolRange::new("new-york", -5.0, 30.0),
                SymbolRange::new("tokyo", 5.0, 32.0),
                SymbolRange::new("sydney", 10.0, 35.0),
            ],
        )
    }

    pub fn ranges(&self) -> &[SymbolRange] {
        &self.ranges
    }

    fn sample(&self) -> Vec<Result<Reading, FetchError>> {
        let mut rng = rand::thread_rng();
        self.ranges
            .iter()
            .map(|range| {
                let value = rng.gen_range(range.min..=range.max);
                Ok(Reading::new(&self.source, &range.symbol, value)?)
            })
            .collect()
    }
}

#[async_trait]
impl Fetcher for SyntheticFetcher {
    fn source(&self) -> &str {
        &self.source
    }

    async fn fetch(&self) -> Vec<Result<Reading, FetchError>> {
        self.sample()
    }
}
