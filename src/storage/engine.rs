use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

use super::store::{ReadingStore, StoreError, StoreStats};
use crate::data::{HistoryRange, Reading, SeriesKey};

/// Readings of a single (source, symbol) stream, in arrival order
#[derive(Debug, Default)]
struct Series {
    readings: RwLock<Vec<Reading>>,
}

/// In-memory reading store
pub struct MemoryStore {
    /// Series indexed by (source, symbol)
    series: DashMap<SeriesKey, Arc<Series>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            series: DashMap::new(),
        }
    }

    /// Insert a reading (creates the series if it does not exist).
    ///
    /// The push happens while the map guard is held, so a concurrent
    /// expiry sweep cannot drop the series out from under the write.
    pub fn insert(&self, reading: Reading) {
        let key = reading.key();
        if let Some(series) = self.series.get(&key) {
            series.readings.write().push(reading);
            return;
        }

        self.series
            .entry(key)
            .or_default()
            .readings
            .write()
            .push(reading);
    }

    /// Readings for a key observed in `[since, until]`, ascending by time
    pub fn range(
        &self,
        source: &str,
        symbol: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Vec<Reading> {
        let key = SeriesKey::new(source, symbol);
        let Some(series) = self.series.get(&key).map(|s| Arc::clone(&s)) else {
            return Vec::new();
        };

        let mut matched: Vec<Reading> = series
            .readings
            .read()
            .iter()
            .filter(|r| r.observed_at >= since && r.observed_at <= until)
            .cloned()
            .collect();

        matched.sort_by_key(|r| r.observed_at);
        matched
    }

    /// Remove every reading observed before `cutoff`.
    /// Returns the number of readings removed.
    pub fn expire_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;

        for entry in self.series.iter() {
            let mut readings = entry.value().readings.write();
            let before = readings.len();
            readings.retain(|r| r.observed_at >= cutoff);
            removed += before - readings.len();
        }

        // Drop series that no longer hold anything
        self.series.retain(|_, s| !s.readings.read().is_empty());

        removed
    }

    pub fn stats(&self) -> StoreStats {
        let reading_count = self
            .series
            .iter()
            .map(|e| e.value().readings.read().len())
            .sum();

        StoreStats {
            series_count: self.series.len(),
            reading_count,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        self.insert(reading.clone());
        Ok(())
    }

    async fn query(
        &self,
        source: &str,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<Reading>, StoreError> {
        let now = Utc::now();
        Ok(self.range(source, symbol, now - range.duration(), now))
    }

    fn stats(&self) -> Option<StoreStats> {
        Some(MemoryStore::stats(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading_ago(symbol: &str, value: f64, ago: Duration) -> Reading {
        Reading::at("finance", symbol, value, Utc::now() - ago).unwrap()
    }

    #[test]
    fn test_insert_creates_series() {
        let store = MemoryStore::new();
        store.insert(reading_ago("AAPL", 1.0, Duration::zero()));
        store.insert(reading_ago("AAPL", 2.0, Duration::zero()));
        store.insert(reading_ago("MSFT", 3.0, Duration::zero()));

        let stats = store.stats();
        assert_eq!(stats.series_count, 2);
        assert_eq!(stats.reading_count, 3);
    }

    #[test]
    fn test_query_one_hour_window_sorted() {
        let store = MemoryStore::new();

        // Inserted out of order, one outside the window
        store.insert(reading_ago("AAPL", 3.0, Duration::minutes(5)));
        store.insert(reading_ago("AAPL", 0.0, Duration::minutes(90)));
        store.insert(reading_ago("AAPL", 1.0, Duration::minutes(50)));
        store.insert(reading_ago("AAPL", 2.0, Duration::minutes(20)));
        store.insert(reading_ago("MSFT", 9.0, Duration::minutes(1)));

        let result =
            tokio_test::block_on(store.query("finance", "AAPL", HistoryRange::OneHour)).unwrap();

        let values: Vec<f64> = result.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
        assert!(result
            .windows(2)
            .all(|w| w[0].observed_at <= w[1].observed_at));
    }

    #[test]
    fn test_query_unknown_series_is_empty() {
        let store = MemoryStore::new();
        let result =
            tokio_test::block_on(store.query("finance", "NOPE", HistoryRange::SevenDays)).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_append_through_gateway() {
        let store = MemoryStore::new();
        let reading = reading_ago("TSLA", 250.0, Duration::seconds(1));
        tokio_test::block_on(store.append(&reading)).unwrap();

        let result = tokio_test::block_on(store.query(
            "finance",
            "TSLA",
            HistoryRange::ThirtyMinutes,
        ))
        .unwrap();
        assert_eq!(result, vec![reading]);
    }

    #[test]
    fn test_insert_survives_concurrent_expiry() {
        let store = Arc::new(MemoryStore::new());
        let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let sweeper = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                while !done.load(std::sync::atomic::Ordering::SeqCst) {
                    store.expire_before(Utc::now() - Duration::days(7));
                }
            })
        };

        let rounds = 50;
        let per_round = 500;
        for round in 0..rounds {
            for i in 0..per_round {
                // Fresh series every time, so each insert races the sweep's cleanup
                let symbol = format!("S{}-{}", round, i);
                store.insert(reading_ago(&symbol, i as f64, Duration::zero()));
            }
        }

        done.store(true, std::sync::atomic::Ordering::SeqCst);
        sweeper.join().unwrap();

        let stats = store.stats();
        assert_eq!(stats.reading_count, rounds * per_round);
        assert_eq!(stats.series_count, rounds * per_round);
    }

    #[test]
    fn test_expire_before() {
        let store = MemoryStore::new();
        store.insert(reading_ago("AAPL", 1.0, Duration::days(10)));
        store.insert(reading_ago("AAPL", 2.0, Duration::hours(1)));
        store.insert(reading_ago("MSFT", 3.0, Duration::days(8)));

        let removed = store.expire_before(Utc::now() - Duration::days(7));
        assert_eq!(removed, 2);

        let stats = store.stats();
        assert_eq!(stats.reading_count, 1);
        assert_eq!(stats.series_count, 1);
    }
}
