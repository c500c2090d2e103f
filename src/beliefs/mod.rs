//! Belief Store - Incremental per-symbol belief aggregation
//!
//! Holds one aggregated belief record per symbol and folds each producer
//! update into it with the standard incremental-mean recurrence. Records
//! are created lazily, mutated by every update and removed only by the
//! stale sweep or a full reset.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

use crate::error::{check_range, Result};

/// Aggregated directional belief for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Belief {
    /// Symbol this belief concerns
    pub symbol: String,
    /// Aggregated bullish component in [0, 1]
    pub bullish: f64,
    /// Aggregated bearish component in [0, 1]
    pub bearish: f64,
    /// Always max(bullish, bearish), recomputed on every update
    pub confidence: f64,
    /// Distinct producer ids that have ever updated this symbol,
    /// in order of first appearance. Grows monotonically.
    pub contributors: Vec<String>,
    /// Timestamp of the most recent update in milliseconds
    pub last_update: i64,
}

impl Belief {
    fn new(symbol: &str, now: i64) -> Self {
        Self {
            symbol: symbol.to_string(),
            bullish: 0.0,
            bearish: 0.0,
            confidence: 0.0,
            contributors: Vec::new(),
            last_update: now,
        }
    }

    /// Absolute difference between the belief components; proxy for
    /// disagreement / strength of signal.
    pub fn divergence(&self) -> f64 {
        (self.bullish - self.bearish).abs()
    }
}

/// In-memory store of per-symbol beliefs
pub struct BeliefStore {
    beliefs: RwLock<HashMap<String, Belief>>,
    update_count: AtomicU64,
}

impl BeliefStore {
    pub fn new() -> Self {
        Self {
            beliefs: RwLock::new(HashMap::new()),
            update_count: AtomicU64::new(0),
        }
    }

    /// Fold one producer observation into the symbol's belief.
    ///
    /// With `n` distinct contributors after this call, the components move
    /// by weight `1/n` toward the supplied values - the online running
    /// mean when each producer submits exactly once. A producer updating
    /// twice is treated as an extra independent sample, not a correction
    /// of its prior vote; repeat updates are legitimate new observations.
    ///
    /// The whole step runs under one write lock and confidence is
    /// recomputed before the lock is released, so readers never observe a
    /// partially updated record.
    ///
    /// Returns a snapshot of the updated record so the caller can run
    /// anomaly scanning on it.
    pub fn update(
        &self,
        producer_id: &str,
        symbol: &str,
        bullish: f64,
        bearish: f64,
    ) -> Result<Belief> {
        check_range("bullish", bullish, 0.0, 1.0)?;
        check_range("bearish", bearish, 0.0, 1.0)?;

        let now = Utc::now().timestamp_millis();
        let mut beliefs = self.beliefs.write().unwrap_or_else(PoisonError::into_inner);

        let belief = beliefs
            .entry(symbol.to_string())
            .or_insert_with(|| Belief::new(symbol, now));

        if !belief.contributors.iter().any(|c| c == producer_id) {
            belief.contributors.push(producer_id.to_string());
        }
        let n = belief.contributors.len();
        let w = 1.0 / n as f64;

        belief.bullish = belief.bullish * (1.0 - w) + bullish * w;
        belief.bearish = belief.bearish * (1.0 - w) + bearish * w;
        belief.confidence = belief.bullish.max(belief.bearish);
        belief.last_update = now;

        self.update_count.fetch_add(1, Ordering::Relaxed);
        debug!(
            symbol,
            producer_id,
            bullish = belief.bullish,
            bearish = belief.bearish,
            contributors = n,
            "belief updated"
        );

        Ok(belief.clone())
    }

    /// Get the belief for a symbol, if any
    pub fn get(&self, symbol: &str) -> Option<Belief> {
        self.beliefs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .cloned()
    }

    /// Snapshot of every tracked belief
    pub fn all(&self) -> Vec<Belief> {
        self.beliefs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of tracked symbols
    pub fn len(&self) -> usize {
        self.beliefs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total update calls accepted since construction or last reset
    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::Relaxed)
    }

    /// Remove beliefs whose last update is older than `max_age_ms`
    pub fn cleanup_stale(&self, max_age_ms: i64) -> usize {
        self.cleanup_stale_at(Utc::now().timestamp_millis(), max_age_ms)
    }

    pub(crate) fn cleanup_stale_at(&self, now: i64, max_age_ms: i64) -> usize {
        let mut beliefs = self.beliefs.write().unwrap_or_else(PoisonError::into_inner);
        let before = beliefs.len();
        beliefs.retain(|_, b| now - b.last_update <= max_age_ms);
        let removed = before - beliefs.len();
        if removed > 0 {
            info!(removed, remaining = beliefs.len(), "stale beliefs evicted");
        }
        removed
    }

    /// Clear all beliefs unconditionally. Irrecoverable.
    pub fn reset(&self) {
        self.beliefs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.update_count.store(0, Ordering::Relaxed);
    }
}

impl Default for BeliefStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_update_equals_inputs() {
        let store = BeliefStore::new();
        let b = store.update("agent-1", "BTCUSDT", 0.7, 0.2).unwrap();
        assert_eq!(b.bullish, 0.7);
        assert_eq!(b.bearish, 0.2);
        assert_eq!(b.confidence, 0.7);
        assert_eq!(b.contributors, vec!["agent-1".to_string()]);
    }

    #[test]
    fn test_running_mean_over_distinct_producers() {
        let store = BeliefStore::new();
        let inputs = [(0.9, 0.1), (0.5, 0.5), (0.1, 0.7), (0.7, 0.3)];
        let mut last = None;
        for (i, (bu, be)) in inputs.iter().enumerate() {
            last = Some(
                store
                    .update(&format!("agent-{i}"), "ETHUSDT", *bu, *be)
                    .unwrap(),
            );
        }
        let b = last.unwrap();
        let mean_bu = inputs.iter().map(|(bu, _)| bu).sum::<f64>() / inputs.len() as f64;
        let mean_be = inputs.iter().map(|(_, be)| be).sum::<f64>() / inputs.len() as f64;
        assert!((b.bullish - mean_bu).abs() < 1e-12);
        assert!((b.bearish - mean_be).abs() < 1e-12);
        assert_eq!(b.confidence, b.bullish.max(b.bearish));
    }

    #[test]
    fn test_repeat_producer_counts_as_new_sample() {
        let store = BeliefStore::new();
        store.update("agent-1", "BTCUSDT", 1.0, 0.0).unwrap();
        let b = store.update("agent-1", "BTCUSDT", 0.0, 0.0).unwrap();
        // Contributor set unchanged, so the second call folds in with w=1
        // and replaces the component entirely.
        assert_eq!(b.contributors.len(), 1);
        assert_eq!(b.bullish, 0.0);
    }

    #[test]
    fn test_contributors_grow_monotonically() {
        let store = BeliefStore::new();
        store.update("a", "SOLUSDT", 0.5, 0.5).unwrap();
        store.update("b", "SOLUSDT", 0.5, 0.5).unwrap();
        let b = store.update("a", "SOLUSDT", 0.5, 0.5).unwrap();
        assert_eq!(b.contributors, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_out_of_range_inputs_rejected() {
        let store = BeliefStore::new();
        assert!(store.update("a", "BTCUSDT", 1.5, 0.0).is_err());
        assert!(store.update("a", "BTCUSDT", 0.5, -0.1).is_err());
        assert!(store.update("a", "BTCUSDT", f64::NAN, 0.0).is_err());
        // Rejected inputs never create a record
        assert!(store.get("BTCUSDT").is_none());
    }

    #[test]
    fn test_cleanup_stale_removes_old_records() {
        let store = BeliefStore::new();
        let b = store.update("a", "BTCUSDT", 0.5, 0.5).unwrap();
        store.update("a", "ETHUSDT", 0.5, 0.5).unwrap();

        // Sweep as if an hour has passed; both records become stale.
        let removed = store.cleanup_stale_at(b.last_update + 3_600_001, 3_600_000);
        assert_eq!(removed, 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_cleanup_stale_keeps_fresh_records() {
        let store = BeliefStore::new();
        let b = store.update("a", "BTCUSDT", 0.5, 0.5).unwrap();
        let removed = store.cleanup_stale_at(b.last_update + 1000, 3_600_000);
        assert_eq!(removed, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = BeliefStore::new();
        store.update("a", "BTCUSDT", 0.5, 0.5).unwrap();
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.update_count(), 0);
    }
}
