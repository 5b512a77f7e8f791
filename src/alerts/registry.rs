//! Pending alert rules, keyed by (source, symbol)

use dashmap::DashMap;

use super::config::AlertRule;
use crate::data::{Reading, SeriesKey};
use crate::scheduler::SessionId;

/// A registered rule and the session that owns it
#[derive(Debug, Clone)]
struct PendingRule {
    rule: AlertRule,
    owner: SessionId,
}

/// Registry of pending one-shot rules
///
/// Each key's rule list is only touched while holding that key's entry
/// lock, so evaluate-and-remove is atomic per key: a rule is handed out
/// by [`AlertRegistry::take_matching`] at most once, and a rule
/// registered while an evaluation of the same key is in progress is only
/// seen by the next evaluation.
pub struct AlertRegistry {
    rules: DashMap<SeriesKey, Vec<PendingRule>>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self {
            rules: DashMap::new(),
        }
    }

    /// Register a rule. No deduplication, no limit.
    pub fn register(&self, rule: AlertRule, owner: SessionId) -> Result<(), AlertError> {
        if !rule.threshold.is_finite() {
            return Err(AlertError::InvalidThreshold(rule.threshold));
        }
        if rule.source.trim().is_empty() || rule.symbol.trim().is_empty() {
            return Err(AlertError::MissingKey);
        }

        self.rules
            .entry(rule.key())
            .or_default()
            .push(PendingRule { rule, owner });
        Ok(())
    }

    /// Remove and return every pending rule matched by `reading`.
    /// Unmatched rules stay pending in their original order.
    pub fn take_matching(&self, reading: &Reading) -> Vec<AlertRule> {
        let key = reading.key();

        let fired: Vec<AlertRule> = {
            let Some(mut pending) = self.rules.get_mut(&key) else {
                return Vec::new();
            };

            let (fired, kept): (Vec<PendingRule>, Vec<PendingRule>) =
                std::mem::take(&mut *pending)
                    .into_iter()
                    .partition(|p| p.rule.matches(reading.value));
            *pending = kept;

            fired.into_iter().map(|p| p.rule).collect()
        };

        if !fired.is_empty() {
            self.rules.remove_if(&key, |_, pending| pending.is_empty());
        }

        fired
    }

    /// Drop every rule owned by a session. Returns how many were dropped.
    pub fn drop_owner(&self, owner: &SessionId) -> usize {
        let mut dropped = 0;

        self.rules.retain(|_, pending| {
            let before = pending.len();
            pending.retain(|p| &p.owner != owner);
            dropped += before - pending.len();
            !pending.is_empty()
        });

        dropped
    }

    /// Pending rules for one key, in registration order
    pub fn pending_for(&self, source: &str, symbol: &str) -> Vec<AlertRule> {
        self.rules
            .get(&SeriesKey::new(source, symbol))
            .map(|pending| pending.iter().map(|p| p.rule.clone()).collect())
            .unwrap_or_default()
    }

    /// Total pending rules across all keys
    pub fn pending_count(&self) -> usize {
        self.rules.iter().map(|e| e.value().len()).sum()
    }
}

impl Default for AlertRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Alert registration errors
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Threshold {0} is not a finite number")]
    InvalidThreshold(f64),

    #[error("Alert rule needs a source and a symbol")]
    MissingKey,
}
