//! Consensus Engine - Point-in-time collective decision derivation
//!
//! Derives a direction, confidence and vote tally from a belief snapshot
//! plus the anomaly ledger. Decisions are recomputed on every query and
//! never stored.

use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyDetector;
use crate::beliefs::Belief;
use crate::config::ConsensusConfig;
use crate::types::Direction;

/// Derived collective decision for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectiveDecision {
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    /// Divergence of the underlying belief, read as agreement strength
    pub consensus_level: f64,
    pub total_votes: usize,
    pub long_votes: usize,
    pub short_votes: usize,
    pub neutral_votes: usize,
    /// True if a stored critical anomaly names this symbol
    pub anomaly_present: bool,
}

impl CollectiveDecision {
    fn neutral(symbol: &str, confidence: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            direction: Direction::Neutral,
            confidence,
            consensus_level: 0.0,
            total_votes: 0,
            long_votes: 0,
            short_votes: 0,
            neutral_votes: 0,
            anomaly_present: false,
        }
    }
}

/// Stateless decision logic over belief snapshots
pub struct ConsensusEngine {
    config: ConsensusConfig,
}

impl ConsensusEngine {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Derive the collective decision for a symbol.
    ///
    /// The direction uses a dead-zone margin: a side must lead the other
    /// by more than `direction_margin` before it is called, avoiding
    /// flip-flopping on near-tied beliefs.
    ///
    /// Vote counts are an approximation: there is no per-contributor
    /// record of each producer's own submitted direction, so every
    /// contributor is tallied toward whichever side the aggregate belief
    /// favors. The tally is always (all, 0, 0) or (0, all, 0), never a
    /// genuine mixed count.
    pub fn decide(
        &self,
        symbol: &str,
        belief: Option<&Belief>,
        anomalies: &AnomalyDetector,
    ) -> CollectiveDecision {
        let belief = match belief {
            Some(b) if !b.contributors.is_empty() => b,
            _ => return CollectiveDecision::neutral(symbol, self.config.default_confidence),
        };

        let margin = self.config.direction_margin;
        let direction = if belief.bullish > belief.bearish + margin {
            Direction::Long
        } else if belief.bearish > belief.bullish + margin {
            Direction::Short
        } else {
            Direction::Neutral
        };

        let n = belief.contributors.len();
        let (long_votes, short_votes) = if belief.bullish > belief.bearish {
            (n, 0)
        } else {
            (0, n)
        };

        CollectiveDecision {
            symbol: symbol.to_string(),
            direction,
            confidence: belief.confidence,
            consensus_level: belief.divergence(),
            total_votes: n,
            long_votes,
            short_votes,
            neutral_votes: 0,
            anomaly_present: anomalies.has_critical_for(symbol),
        }
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(ConsensusConfig::default())
    }
}
