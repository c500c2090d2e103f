//! Collective Intelligence service - the single process-resident authority
//!
//! Explicit service object owning the belief store, anomaly detector and
//! sentiment ledgers. Constructed once per deployment and shared by
//! handle; there is no hidden global. Producers push observations in,
//! readers pull decisions and summaries on demand.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::anomaly::{AnomalyAlert, AnomalyDetector};
use crate::beliefs::{Belief, BeliefStore};
use crate::config::AppConfig;
use crate::consensus::{CollectiveDecision, ConsensusEngine};
use crate::error::Result;
use crate::sentiment::{Recommendation, SentimentLedger, SentimentSummary};
use crate::types::{SentimentObservation, WhaleEvent};

/// Which upstream source categories the host has wired in
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceFlags {
    pub news: bool,
    pub social: bool,
    pub whale: bool,
}

/// Aggregate counters for dashboards and health checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectiveStatus {
    pub symbols_tracked: usize,
    pub belief_updates: u64,
    pub avg_belief_confidence: f64,
    pub sentiment_observations: usize,
    pub whale_events: usize,
    pub anomalies_total: usize,
    pub active_anomalies: usize,
    pub sources: SourceFlags,
    pub timestamp: i64,
}

/// The aggregation core behind the public API surface
pub struct CollectiveIntelligence {
    config: AppConfig,
    beliefs: BeliefStore,
    anomalies: AnomalyDetector,
    consensus: ConsensusEngine,
    sentiment: SentimentLedger,
}

impl CollectiveIntelligence {
    pub fn new(config: AppConfig) -> Self {
        Self {
            beliefs: BeliefStore::new(),
            anomalies: AnomalyDetector::new(config.anomaly.clone()),
            consensus: ConsensusEngine::new(config.consensus.clone()),
            sentiment: SentimentLedger::new(config.sentiment.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fold one producer belief into the symbol's record, then scan the
    /// updated record for anomalies.
    pub fn update(
        &self,
        producer_id: &str,
        symbol: &str,
        bullish: f64,
        bearish: f64,
    ) -> Result<()> {
        let snapshot = self.beliefs.update(producer_id, symbol, bullish, bearish)?;
        self.anomalies.scan(&snapshot);
        Ok(())
    }

    /// Derive the point-in-time collective decision for a symbol.
    /// Recomputed on every call, never stored.
    pub fn decide(&self, symbol: &str) -> CollectiveDecision {
        let belief = self.beliefs.get(symbol);
        self.consensus.decide(symbol, belief.as_ref(), &self.anomalies)
    }

    pub fn all_beliefs(&self) -> Vec<Belief> {
        self.beliefs.all()
    }

    pub fn active_anomalies(&self) -> Vec<AnomalyAlert> {
        self.anomalies.active_anomalies()
    }

    pub fn add_sentiment(&self, observation: SentimentObservation) -> Result<()> {
        self.sentiment.add_sentiment(observation)
    }

    pub fn add_whale_event(&self, event: WhaleEvent) -> Result<()> {
        self.sentiment.add_whale_event(event)
    }

    pub fn summary(&self) -> SentimentSummary {
        self.sentiment.summary()
    }

    /// Snapshot of the whale ledger, oldest first
    pub fn whale_events(&self) -> Vec<WhaleEvent> {
        self.sentiment.whale_events()
    }

    pub fn recommendation(&self) -> Recommendation {
        self.sentiment.recommendation()
    }

    /// Aggregate counters over every store
    pub fn status(&self) -> CollectiveStatus {
        let beliefs = self.beliefs.all();
        let avg_belief_confidence = if beliefs.is_empty() {
            0.0
        } else {
            beliefs.iter().map(|b| b.confidence).sum::<f64>() / beliefs.len() as f64
        };

        CollectiveStatus {
            symbols_tracked: beliefs.len(),
            belief_updates: self.beliefs.update_count(),
            avg_belief_confidence,
            sentiment_observations: self.sentiment.observation_count(),
            whale_events: self.sentiment.whale_count(),
            anomalies_total: self.anomalies.len(),
            active_anomalies: self.anomalies.active_anomalies().len(),
            sources: SourceFlags {
                news: self.config.sources.news_enabled,
                social: self.config.sources.social_enabled,
                whale: self.config.sources.whale_enabled,
            },
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Manual stale-belief sweep; returns the number of records removed
    pub fn cleanup_stale(&self, max_age_ms: i64) -> usize {
        self.beliefs.cleanup_stale(max_age_ms)
    }

    /// Clear all in-memory state unconditionally. Irrecoverable.
    pub fn reset(&self) {
        self.beliefs.reset();
        self.anomalies.reset();
        self.sentiment.reset();
        info!("collective state reset");
    }

    /// Spawn the scheduled stale-belief sweep on the current tokio
    /// runtime. The task holds only a weak handle and exits when the
    /// service is dropped.
    pub fn spawn_maintenance(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let interval = Duration::from_secs(self.config.maintenance.sweep_interval_secs.max(1));
        let max_age_ms = self.config.maintenance.belief_max_age_ms;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(service) => {
                        service.cleanup_stale(max_age_ms);
                    }
                    None => break,
                }
            }
        })
    }
}

impl Default for CollectiveIntelligence {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceKind, WhaleDirection};

    #[test]
    fn test_update_triggers_anomaly_scan() {
        let svc = CollectiveIntelligence::default();
        // Four producers all strongly bullish: divergence > 0.8 once the
        // contributor count passes 3.
        for i in 0..4 {
            svc.update(&format!("agent-{i}"), "BTCUSDT", 0.95, 0.02)
                .unwrap();
        }
        let active = svc.active_anomalies();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].affected_symbols, vec!["BTCUSDT".to_string()]);
    }

    #[test]
    fn test_status_counters() {
        let svc = CollectiveIntelligence::default();
        svc.update("a", "BTCUSDT", 0.6, 0.2).unwrap();
        svc.update("b", "ETHUSDT", 0.3, 0.5).unwrap();
        svc.add_sentiment(SentimentObservation::new(
            SourceKind::News,
            0.4,
            0.9,
            "feed",
        ))
        .unwrap();
        svc.add_whale_event(WhaleEvent::new(
            "BTCUSDT",
            10.0,
            1_000_000.0,
            WhaleDirection::Buy,
            "a",
            "b",
        ))
        .unwrap();

        let status = svc.status();
        assert_eq!(status.symbols_tracked, 2);
        assert_eq!(status.belief_updates, 2);
        // whale event synthesized a second observation
        assert_eq!(status.sentiment_observations, 2);
        assert_eq!(status.whale_events, 1);
        assert!(status.sources.news);
        assert!((status.avg_belief_confidence - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_reset_cascades_to_all_stores() {
        let svc = CollectiveIntelligence::default();
        for i in 0..4 {
            svc.update(&format!("agent-{i}"), "BTCUSDT", 0.95, 0.02)
                .unwrap();
        }
        svc.add_sentiment(SentimentObservation::new(
            SourceKind::Social,
            0.2,
            0.5,
            "feed",
        ))
        .unwrap();

        svc.reset();
        let status = svc.status();
        assert_eq!(status.symbols_tracked, 0);
        assert_eq!(status.sentiment_observations, 0);
        assert_eq!(status.anomalies_total, 0);
        assert_eq!(status.belief_updates, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_task_exits_when_service_dropped() {
        let mut config = AppConfig::default();
        config.maintenance.sweep_interval_secs = 1;
        let svc = Arc::new(CollectiveIntelligence::new(config));
        let handle = svc.spawn_maintenance();

        drop(svc);
        tokio::time::advance(Duration::from_secs(2)).await;
        handle.await.unwrap();
    }
}
