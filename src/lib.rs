//! Hivemind Library
//!
//! Collective intelligence core for trading systems: aggregates
//! per-agent beliefs, news/social sentiment and whale flow into a
//! per-symbol consensus with anomaly and trend detection.

pub mod anomaly;
pub mod beliefs;
pub mod collective;
pub mod config;
pub mod consensus;
pub mod error;
pub mod logging;
pub mod sentiment;
pub mod types;

pub use collective::CollectiveIntelligence;
pub use error::{HivemindError, Result};
