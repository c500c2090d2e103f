//! Anomaly Detector - Belief divergence scanning
//!
//! Scans each updated belief for extreme divergence backed by enough
//! contributors and keeps a bounded ring of raised alerts. Eviction is
//! strictly FIFO by insertion order; severity is not considered, so an
//! old critical alert can be displaced by a newer high one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::warn;
use uuid::Uuid;

use crate::beliefs::Belief;
use crate::config::AnomalyConfig;
use crate::types::Severity;

/// Kind tag of an anomaly alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    /// Collective belief behaving abnormally (extreme one-sided divergence)
    Behavior,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::Behavior => write!(f, "behavior"),
        }
    }
}

/// A raised anomaly alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyAlert {
    /// Unique alert id
    pub id: String,
    pub kind: AnomalyKind,
    pub severity: Severity,
    /// Human-readable description naming the symbol
    pub description: String,
    /// Symbols this alert concerns
    pub affected_symbols: Vec<String>,
    /// Detector confidence in the alert (the divergence itself)
    pub confidence: f64,
    /// Static operator guidance
    pub recommendation: String,
    /// Timestamp in milliseconds
    pub raised_at: i64,
}

/// Divergence scanner with a bounded alert ring
pub struct AnomalyDetector {
    config: AnomalyConfig,
    alerts: RwLock<VecDeque<AnomalyAlert>>,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self {
            config,
            alerts: RwLock::new(VecDeque::new()),
        }
    }

    /// Scan a belief snapshot after an update.
    ///
    /// Raises a high-severity behavior alert iff divergence strictly
    /// exceeds the threshold AND the contributor count strictly exceeds
    /// the minimum. Boundary values do not trigger.
    pub fn scan(&self, belief: &Belief) {
        let divergence = belief.divergence();
        if divergence <= self.config.divergence_threshold
            || belief.contributors.len() <= self.config.min_contributors
        {
            return;
        }

        let alert = AnomalyAlert {
            id: Uuid::new_v4().to_string(),
            kind: AnomalyKind::Behavior,
            severity: Severity::High,
            description: format!(
                "Extreme belief divergence on {}: {:.2} across {} contributors",
                belief.symbol,
                divergence,
                belief.contributors.len()
            ),
            affected_symbols: vec![belief.symbol.clone()],
            confidence: divergence,
            recommendation: "Wait for confirmation before acting on this signal".to_string(),
            raised_at: Utc::now().timestamp_millis(),
        };

        warn!(
            symbol = %belief.symbol,
            divergence,
            contributors = belief.contributors.len(),
            "behavior anomaly raised"
        );

        let mut alerts = self.alerts.write().unwrap_or_else(PoisonError::into_inner);
        alerts.push_back(alert);
        // FIFO cap: the oldest entry goes regardless of its severity
        while alerts.len() > self.config.max_alerts {
            alerts.pop_front();
        }
    }

    /// Alerts with high or critical severity, oldest first
    pub fn active_anomalies(&self) -> Vec<AnomalyAlert> {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|a| a.severity.is_active())
            .cloned()
            .collect()
    }

    /// Every stored alert, oldest first
    pub fn all_alerts(&self) -> Vec<AnomalyAlert> {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Whether any stored alert names this symbol at critical severity
    pub fn has_critical_for(&self, symbol: &str) -> bool {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|a| {
                a.severity == Severity::Critical && a.affected_symbols.iter().any(|s| s == symbol)
            })
    }

    /// Number of stored alerts
    pub fn len(&self) -> usize {
        self.alerts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all alerts unconditionally
    pub fn reset(&self) {
        self.alerts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[cfg(test)]
    pub(crate) fn push_for_test(&self, alert: AnomalyAlert) {
        let mut alerts = self.alerts.write().unwrap_or_else(PoisonError::into_inner);
        alerts.push_back(alert);
        while alerts.len() > self.config.max_alerts {
            alerts.pop_front();
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}
