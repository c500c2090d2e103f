//! Configuration management for Hivemind
//!
//! The algorithmic constants (margins, thresholds, ledger capacities) are
//! compiled in via the `Default` impls below. `AppConfig::load` layers the
//! host-side knobs from optional YAML files + environment variables.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Consensus derivation tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    /// Dead-zone margin between bullish and bearish before a direction is called
    pub direction_margin: f64,
    /// Confidence reported when no belief exists for a symbol
    pub default_confidence: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            direction_margin: 0.2,
            default_confidence: 0.5,
        }
    }
}

/// Anomaly detection tuning
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    /// Divergence must exceed this (strictly) to raise an alert
    pub divergence_threshold: f64,
    /// Contributor count must exceed this (strictly) to raise an alert
    pub min_contributors: usize,
    /// Alert ring capacity, FIFO eviction
    pub max_alerts: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            divergence_threshold: 0.8,
            min_contributors: 3,
            max_alerts: 20,
        }
    }
}

/// Sentiment ledger and recommendation tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SentimentConfig {
    /// Sentiment ledger capacity, FIFO eviction
    pub max_observations: usize,
    /// Whale ledger capacity, FIFO eviction
    pub max_whale_events: usize,
    /// Per-source weights for the overall score
    pub news_weight: f64,
    pub social_weight: f64,
    pub whale_weight: f64,
    /// Rolling window size for trend comparison
    pub trend_window: usize,
    /// Minimum window-mean difference to leave `stable`
    pub trend_threshold: f64,
    /// Observation count at which summary confidence saturates
    pub confidence_saturation: usize,
    /// Overall score above which `buy` is recommended
    pub buy_threshold: f64,
    /// Overall score below which `sell` is recommended
    pub sell_threshold: f64,
    /// Minimum summary confidence for a buy/sell call
    pub min_confidence: f64,
    /// USD value above which a whale event is high impact
    pub whale_high_impact_usd: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            max_observations: 1000,
            max_whale_events: 50,
            news_weight: 0.4,
            social_weight: 0.4,
            whale_weight: 0.2,
            trend_window: 10,
            trend_threshold: 0.1,
            confidence_saturation: 100,
            buy_threshold: 0.3,
            sell_threshold: -0.3,
            min_confidence: 0.6,
            whale_high_impact_usd: 10_000_000.0,
        }
    }
}

/// Which upstream source categories the host has wired in.
/// Reporting only; ingestion is never gated on these flags.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub news_enabled: bool,
    pub social_enabled: bool,
    pub whale_enabled: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            news_enabled: true,
            social_enabled: true,
            whale_enabled: true,
        }
    }
}

/// Scheduled stale-belief sweep
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// Sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Beliefs older than this are evicted by the sweep
    pub belief_max_age_ms: i64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
            belief_max_age_ms: 3_600_000, // 1 hour
        }
    }
}

/// Full configuration for the collective intelligence service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Consensus defaults
            .set_default("consensus.direction_margin", 0.2)?
            .set_default("consensus.default_confidence", 0.5)?
            // Anomaly defaults
            .set_default("anomaly.divergence_threshold", 0.8)?
            .set_default("anomaly.min_contributors", 3)?
            .set_default("anomaly.max_alerts", 20)?
            // Sentiment defaults
            .set_default("sentiment.max_observations", 1000)?
            .set_default("sentiment.max_whale_events", 50)?
            .set_default("sentiment.news_weight", 0.4)?
            .set_default("sentiment.social_weight", 0.4)?
            .set_default("sentiment.whale_weight", 0.2)?
            .set_default("sentiment.trend_window", 10)?
            .set_default("sentiment.trend_threshold", 0.1)?
            .set_default("sentiment.confidence_saturation", 100)?
            .set_default("sentiment.buy_threshold", 0.3)?
            .set_default("sentiment.sell_threshold", -0.3)?
            .set_default("sentiment.min_confidence", 0.6)?
            .set_default("sentiment.whale_high_impact_usd", 10_000_000.0)?
            // Source flags
            .set_default("sources.news_enabled", true)?
            .set_default("sources.social_enabled", true)?
            .set_default("sources.whale_enabled", true)?
            // Maintenance defaults
            .set_default("maintenance.sweep_interval_secs", 300)?
            .set_default("maintenance.belief_max_age_ms", 3_600_000)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (HIVEMIND_*)
            .add_source(Environment::with_prefix("HIVEMIND").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "margin={:.2} divergence_threshold={:.2} caps={}/{}/{} sweep={}s",
            self.consensus.direction_margin,
            self.anomaly.divergence_threshold,
            self.sentiment.max_observations,
            self.sentiment.max_whale_events,
            self.anomaly.max_alerts,
            self.maintenance.sweep_interval_secs,
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
