//! Core types used throughout Hivemind
//!
//! Defines common data structures for directions, sentiment sources,
//! impact tiers and the raw observation/event records fed into the core.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collective trading direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Neutral
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Category of a sentiment data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    News,
    Social,
    Whale,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::News => write!(f, "news"),
            SourceKind::Social => write!(f, "social"),
            SourceKind::Whale => write!(f, "whale"),
        }
    }
}

/// Impact tier of an observation or event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImpactTier {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ImpactTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactTier::Low => write!(f, "low"),
            ImpactTier::Medium => write!(f, "medium"),
            ImpactTier::High => write!(f, "high"),
            ImpactTier::Critical => write!(f, "critical"),
        }
    }
}

/// Direction of a whale transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhaleDirection {
    Buy,
    Sell,
    Transfer,
}

impl fmt::Display for WhaleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhaleDirection::Buy => write!(f, "BUY"),
            WhaleDirection::Sell => write!(f, "SELL"),
            WhaleDirection::Transfer => write!(f, "TRANSFER"),
        }
    }
}

/// Severity of an anomaly alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Alerts at this severity are surfaced by `active_anomalies`
    pub fn is_active(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Rolling sentiment trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Worsening,
    Stable,
}

impl Default for Trend {
    fn default() -> Self {
        Trend::Stable
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Improving => write!(f, "improving"),
            Trend::Worsening => write!(f, "worsening"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

/// Trading action derived from the sentiment summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// A single timestamped, signed, source-tagged sentiment data point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentObservation {
    /// Source category
    pub source: SourceKind,
    /// Signed sentiment in [-1, 1]
    pub sentiment: f64,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Timestamp in milliseconds
    pub timestamp: i64,
    /// Origin label (feed name, venue, tracker id)
    pub origin: String,
    /// Free-text content
    pub content: String,
    /// Impact tier
    pub impact: ImpactTier,
}

impl SentimentObservation {
    pub fn new(source: SourceKind, sentiment: f64, confidence: f64, origin: &str) -> Self {
        Self {
            source,
            sentiment,
            confidence,
            timestamp: Utc::now().timestamp_millis(),
            origin: origin.to_string(),
            content: String::new(),
            impact: ImpactTier::Medium,
        }
    }
}

/// A large asset transfer treated as a high-impact sentiment signal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleEvent {
    /// Symbol the transfer concerns (e.g. "BTCUSDT")
    pub symbol: String,
    /// Transferred amount in base units
    pub amount: f64,
    /// USD value of the transfer
    pub usd_value: f64,
    /// Transfer direction
    pub direction: WhaleDirection,
    /// Source label (wallet, exchange)
    pub from_label: String,
    /// Destination label
    pub to_label: String,
    /// Timestamp in milliseconds
    pub timestamp: i64,
    /// Derived sentiment impact, filled in on ingestion
    #[serde(default)]
    pub sentiment_impact: f64,
    /// Derived impact tier, filled in on ingestion
    #[serde(default = "default_whale_impact")]
    pub impact: ImpactTier,
}

fn default_whale_impact() -> ImpactTier {
    ImpactTier::Medium
}

impl WhaleEvent {
    pub fn new(
        symbol: &str,
        amount: f64,
        usd_value: f64,
        direction: WhaleDirection,
        from_label: &str,
        to_label: &str,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            amount,
            usd_value,
            direction,
            from_label: from_label.to_string(),
            to_label: to_label.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            sentiment_impact: 0.0,
            impact: ImpactTier::Medium,
        }
    }
}
