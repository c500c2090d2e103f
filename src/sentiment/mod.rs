//! Sentiment Ledger - Bounded observation log, trend and recommendation
//!
//! Append-only FIFO ledgers of per-source sentiment observations and
//! whale events. Every accepted whale event synthesizes exactly one
//! whale-sourced observation. Readers pull a source-weighted rolling
//! summary, a trend classification and a trading recommendation; nothing
//! is pushed.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

use crate::config::SentimentConfig;
use crate::error::{check_non_negative, check_range, Result};
use crate::types::{
    Action, ImpactTier, SentimentObservation, SourceKind, Trend, WhaleDirection, WhaleEvent,
};

/// Rolling source-weighted sentiment summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Mean sentiment per source (0.0 when the source has no entries)
    pub news: f64,
    pub social: f64,
    pub whale: f64,
    /// Weighted overall score
    pub overall: f64,
    pub trend: Trend,
    /// min(1, observations / saturation)
    pub confidence: f64,
    /// Observations currently held in the ledger
    pub observations: usize,
}

/// Trading recommendation derived from the summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: Action,
    pub confidence: f64,
    pub reasoning: String,
}

/// Bounded ledgers of sentiment observations and whale events
pub struct SentimentLedger {
    config: SentimentConfig,
    observations: RwLock<VecDeque<SentimentObservation>>,
    whale_events: RwLock<VecDeque<WhaleEvent>>,
}

impl SentimentLedger {
    pub fn new(config: SentimentConfig) -> Self {
        Self {
            config,
            observations: RwLock::new(VecDeque::new()),
            whale_events: RwLock::new(VecDeque::new()),
        }
    }

    /// Append an observation; the oldest entry is evicted past capacity.
    pub fn add_sentiment(&self, observation: SentimentObservation) -> Result<()> {
        check_range("sentiment", observation.sentiment, -1.0, 1.0)?;
        check_range("confidence", observation.confidence, 0.0, 1.0)?;

        debug!(
            source = %observation.source,
            sentiment = observation.sentiment,
            origin = %observation.origin,
            "sentiment recorded"
        );

        let mut obs = self
            .observations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        obs.push_back(observation);
        while obs.len() > self.config.max_observations {
            obs.pop_front();
        }
        Ok(())
    }

    /// Append a whale event and synthesize its derived observation.
    ///
    /// The derived fields are computed here: impact is high when the USD
    /// value exceeds the configured threshold, medium otherwise, and the
    /// sentiment impact is +0.5 for buys and -0.5 for anything else.
    pub fn add_whale_event(&self, mut event: WhaleEvent) -> Result<()> {
        check_non_negative("amount", event.amount)?;
        check_non_negative("usd_value", event.usd_value)?;

        event.impact = if event.usd_value > self.config.whale_high_impact_usd {
            ImpactTier::High
        } else {
            ImpactTier::Medium
        };
        event.sentiment_impact = match event.direction {
            WhaleDirection::Buy => 0.5,
            _ => -0.5,
        };

        debug!(
            symbol = %event.symbol,
            usd_value = event.usd_value,
            direction = %event.direction,
            impact = %event.impact,
            "whale event recorded"
        );

        let derived = SentimentObservation {
            source: SourceKind::Whale,
            sentiment: event.sentiment_impact,
            confidence: 0.8,
            timestamp: event.timestamp,
            origin: "whale-tracker".to_string(),
            content: format!(
                "Whale {} of {:.4} {} (~${:.0})",
                event.direction, event.amount, event.symbol, event.usd_value
            ),
            impact: event.impact,
        };

        {
            let mut whales = self
                .whale_events
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            whales.push_back(event);
            while whales.len() > self.config.max_whale_events {
                whales.pop_front();
            }
        }

        self.add_sentiment(derived)
    }

    /// Compute the rolling summary over the current ledger contents.
    pub fn summary(&self) -> SentimentSummary {
        let obs = self
            .observations
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let news = Self::source_mean(&obs, SourceKind::News);
        let social = Self::source_mean(&obs, SourceKind::Social);
        let whale = Self::source_mean(&obs, SourceKind::Whale);

        let overall = news * self.config.news_weight
            + social * self.config.social_weight
            + whale * self.config.whale_weight;

        let trend = self.classify_trend(&obs);
        let confidence = (obs.len() as f64 / self.config.confidence_saturation as f64).min(1.0);

        SentimentSummary {
            news,
            social,
            whale,
            overall,
            trend,
            confidence,
            observations: obs.len(),
        }
    }

    /// Derive a buy/sell/hold call from the summary. Thresholds are fixed
    /// constants, not configurable per call.
    pub fn recommendation(&self) -> Recommendation {
        let summary = self.summary();

        let action = if summary.overall > self.config.buy_threshold
            && summary.confidence > self.config.min_confidence
        {
            Action::Buy
        } else if summary.overall < self.config.sell_threshold
            && summary.confidence > self.config.min_confidence
        {
            Action::Sell
        } else {
            Action::Hold
        };

        let reasoning = format!(
            "overall sentiment {:+.2} ({} trend) from {} observations, {} whale events",
            summary.overall,
            summary.trend,
            summary.observations,
            self.whale_count()
        );

        Recommendation {
            action,
            confidence: summary.confidence,
            reasoning,
        }
    }

    fn source_mean(obs: &VecDeque<SentimentObservation>, source: SourceKind) -> f64 {
        let mut sum = 0.0;
        let mut count = 0usize;
        for o in obs.iter().filter(|o| o.source == source) {
            sum += o.sentiment;
            count += 1;
        }
        if count == 0 {
            return 0.0;
        }
        sum / count as f64
    }

    /// Compare the mean of the newest window against the window
    /// immediately before it. Too little history forces `stable`.
    fn classify_trend(&self, obs: &VecDeque<SentimentObservation>) -> Trend {
        let w = self.config.trend_window;
        let n = obs.len();
        if n < w {
            return Trend::Stable;
        }

        let recent: f64 = obs.iter().skip(n - w).map(|o| o.sentiment).sum::<f64>() / w as f64;

        let prior_start = n.saturating_sub(2 * w);
        let prior_len = n - w - prior_start;
        if prior_len == 0 {
            return Trend::Stable;
        }
        let prior: f64 = obs
            .iter()
            .skip(prior_start)
            .take(prior_len)
            .map(|o| o.sentiment)
            .sum::<f64>()
            / prior_len as f64;

        let diff = recent - prior;
        if diff > self.config.trend_threshold {
            Trend::Improving
        } else if diff < -self.config.trend_threshold {
            Trend::Worsening
        } else {
            Trend::Stable
        }
    }

    /// Observations currently held
    pub fn observation_count(&self) -> usize {
        self.observations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whale events currently held
    pub fn whale_count(&self) -> usize {
        self.whale_events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Snapshot of the whale ledger, oldest first
    pub fn whale_events(&self) -> Vec<WhaleEvent> {
        self.whale_events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Snapshot of the newest `n` observations, oldest first
    pub fn recent_observations(&self, n: usize) -> Vec<SentimentObservation> {
        let obs = self
            .observations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let skip = obs.len().saturating_sub(n);
        obs.iter().skip(skip).cloned().collect()
    }

    /// Clear both ledgers unconditionally
    pub fn reset(&self) {
        self.observations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.whale_events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for SentimentLedger {
    fn default() -> Self {
        Self::new(SentimentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(source: SourceKind, sentiment: f64) -> SentimentObservation {
        SentimentObservation::new(source, sentiment, 0.9, "test-feed")
    }

    #[test]
    fn test_observation_cap_fifo() {
        let ledger = SentimentLedger::new(SentimentConfig {
            max_observations: 5,
            ..Default::default()
        });
        for i in 0..8 {
            ledger
                .add_sentiment(obs(SourceKind::News, i as f64 / 10.0))
                .unwrap();
        }
        assert_eq!(ledger.observation_count(), 5);
        // Oldest survivor is the fourth insertion (sentiment 0.3)
        let recent = ledger.recent_observations(5);
        assert!((recent[0].sentiment - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_whale_cap_fifo() {
        let ledger = SentimentLedger::new(SentimentConfig {
            max_whale_events: 3,
            max_observations: 1000,
            ..Default::default()
        });
        for i in 0..5 {
            let ev = WhaleEvent::new(
                &format!("SYM{i}"),
                100.0,
                1_000_000.0,
                WhaleDirection::Buy,
                "wallet",
                "exchange",
            );
            ledger.add_whale_event(ev).unwrap();
        }
        let whales = ledger.whale_events();
        assert_eq!(whales.len(), 3);
        assert_eq!(whales[0].symbol, "SYM2");
        // Each event still synthesized one observation
        assert_eq!(ledger.observation_count(), 5);
    }

    #[test]
    fn test_whale_buy_high_impact_synthesis() {
        let ledger = SentimentLedger::default();
        let ev = WhaleEvent::new(
            "BTCUSDT",
            500.0,
            15_000_000.0,
            WhaleDirection::Buy,
            "cold-wallet",
            "binance",
        );
        ledger.add_whale_event(ev).unwrap();

        let stored = &ledger.whale_events()[0];
        assert_eq!(stored.impact, ImpactTier::High);
        assert_eq!(stored.sentiment_impact, 0.5);

        let derived = &ledger.recent_observations(1)[0];
        assert_eq!(derived.source, SourceKind::Whale);
        assert_eq!(derived.sentiment, 0.5);
        assert_eq!(derived.impact, ImpactTier::High);
        assert!(derived.content.contains("BTCUSDT"));
    }

    #[test]
    fn test_whale_sell_medium_impact_synthesis() {
        let ledger = SentimentLedger::default();
        let ev = WhaleEvent::new(
            "BTCUSDT",
            30.0,
            1_000_000.0,
            WhaleDirection::Sell,
            "binance",
            "cold-wallet",
        );
        ledger.add_whale_event(ev).unwrap();

        let stored = &ledger.whale_events()[0];
        assert_eq!(stored.impact, ImpactTier::Medium);
        assert_eq!(stored.sentiment_impact, -0.5);
        assert_eq!(ledger.recent_observations(1)[0].sentiment, -0.5);
    }

    #[test]
    fn test_whale_transfer_counts_as_non_buy() {
        let ledger = SentimentLedger::default();
        let ev = WhaleEvent::new(
            "ETHUSDT",
            1000.0,
            20_000_000.0,
            WhaleDirection::Transfer,
            "a",
            "b",
        );
        ledger.add_whale_event(ev).unwrap();
        assert_eq!(ledger.whale_events()[0].sentiment_impact, -0.5);
        assert_eq!(ledger.whale_events()[0].impact, ImpactTier::High);
    }

    #[test]
    fn test_summary_weights_sources() {
        let ledger = SentimentLedger::default();
        ledger.add_sentiment(obs(SourceKind::News, 0.8)).unwrap();
        ledger.add_sentiment(obs(SourceKind::Social, 0.4)).unwrap();
        ledger.add_sentiment(obs(SourceKind::Whale, -0.5)).unwrap();

        let s = ledger.summary();
        assert!((s.news - 0.8).abs() < 1e-12);
        assert!((s.social - 0.4).abs() < 1e-12);
        assert!((s.whale - (-0.5)).abs() < 1e-12);
        let expected = 0.4 * 0.8 + 0.4 * 0.4 + 0.2 * (-0.5);
        assert!((s.overall - expected).abs() < 1e-12);
        assert!((s.confidence - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_summary_empty_ledger() {
        let ledger = SentimentLedger::default();
        let s = ledger.summary();
        assert_eq!(s.overall, 0.0);
        assert_eq!(s.trend, Trend::Stable);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.observations, 0);
    }

    #[test]
    fn test_trend_improving() {
        let ledger = SentimentLedger::default();
        for _ in 0..10 {
            ledger.add_sentiment(obs(SourceKind::News, 0.0)).unwrap();
        }
        for _ in 0..10 {
            ledger.add_sentiment(obs(SourceKind::News, 0.15)).unwrap();
        }
        assert_eq!(ledger.summary().trend, Trend::Improving);
    }

    #[test]
    fn test_trend_worsening() {
        let ledger = SentimentLedger::default();
        for _ in 0..10 {
            ledger.add_sentiment(obs(SourceKind::News, 0.15)).unwrap();
        }
        for _ in 0..10 {
            ledger.add_sentiment(obs(SourceKind::News, 0.0)).unwrap();
        }
        assert_eq!(ledger.summary().trend, Trend::Worsening);
    }

    #[test]
    fn test_trend_stable_small_difference() {
        let ledger = SentimentLedger::default();
        for _ in 0..10 {
            ledger.add_sentiment(obs(SourceKind::News, 0.0)).unwrap();
        }
        for _ in 0..10 {
            ledger.add_sentiment(obs(SourceKind::News, 0.05)).unwrap();
        }
        assert_eq!(ledger.summary().trend, Trend::Stable);
    }

    #[test]
    fn test_trend_stable_with_few_observations() {
        let ledger = SentimentLedger::default();
        for _ in 0..9 {
            ledger.add_sentiment(obs(SourceKind::News, 1.0)).unwrap();
        }
        assert_eq!(ledger.summary().trend, Trend::Stable);
    }

    #[test]
    fn test_recommendation_buy() {
        let ledger = SentimentLedger::default();
        // 65 observations split across news and social, all 0.625:
        // overall = 0.4*0.625 + 0.4*0.625 = 0.5, confidence = 0.65
        for i in 0..65 {
            let source = if i % 2 == 0 {
                SourceKind::News
            } else {
                SourceKind::Social
            };
            ledger.add_sentiment(obs(source, 0.625)).unwrap();
        }
        let rec = ledger.recommendation();
        assert_eq!(rec.action, Action::Buy);
        assert!((rec.confidence - 0.65).abs() < 1e-12);
        assert!(rec.reasoning.contains("overall sentiment"));
    }

    #[test]
    fn test_recommendation_sell() {
        let ledger = SentimentLedger::default();
        for i in 0..65 {
            let source = if i % 2 == 0 {
                SourceKind::News
            } else {
                SourceKind::Social
            };
            ledger.add_sentiment(obs(source, -0.625)).unwrap();
        }
        let rec = ledger.recommendation();
        assert_eq!(rec.action, Action::Sell);
    }

    #[test]
    fn test_recommendation_hold_weak_signal() {
        let ledger = SentimentLedger::default();
        // High confidence but overall only 0.1
        for i in 0..90 {
            let source = if i % 2 == 0 {
                SourceKind::News
            } else {
                SourceKind::Social
            };
            ledger.add_sentiment(obs(source, 0.125)).unwrap();
        }
        let rec = ledger.recommendation();
        assert_eq!(rec.action, Action::Hold);
        assert!((rec.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_recommendation_hold_low_confidence() {
        let ledger = SentimentLedger::default();
        // Strong signal but far too few observations
        for _ in 0..10 {
            ledger.add_sentiment(obs(SourceKind::News, 1.0)).unwrap();
        }
        assert_eq!(ledger.recommendation().action, Action::Hold);
    }

    #[test]
    fn test_validation_rejects_out_of_domain() {
        let ledger = SentimentLedger::default();
        assert!(ledger.add_sentiment(obs(SourceKind::News, 1.5)).is_err());
        assert!(ledger.add_sentiment(obs(SourceKind::News, -1.5)).is_err());

        let mut bad = obs(SourceKind::Social, 0.5);
        bad.confidence = 1.2;
        assert!(ledger.add_sentiment(bad).is_err());

        let ev = WhaleEvent::new("BTCUSDT", 10.0, -5.0, WhaleDirection::Buy, "a", "b");
        assert!(ledger.add_whale_event(ev).is_err());
        assert_eq!(ledger.observation_count(), 0);
        assert_eq!(ledger.whale_count(), 0);
    }

    #[test]
    fn test_reset_clears_both_ledgers() {
        let ledger = SentimentLedger::default();
        ledger.add_sentiment(obs(SourceKind::News, 0.5)).unwrap();
        let ev = WhaleEvent::new("BTCUSDT", 10.0, 1000.0, WhaleDirection::Buy, "a", "b");
        ledger.add_whale_event(ev).unwrap();
        ledger.reset();
        assert_eq!(ledger.observation_count(), 0);
        assert_eq!(ledger.whale_count(), 0);
    }
}
