// src/analyze/mod.rs
//! Scoring and aggregation core. Pure functions over in-memory items; no I/O.

pub mod aggregate;
pub mod scoring;
pub mod weights;

use chrono::{DateTime, Utc};

use crate::ingest::types::{Item, ScoredItem};

// Re-export convenient types.
pub use crate::analyze::aggregate::{aggregate, bucket_key, matches_whitelist, HotspotBucket};
pub use crate::analyze::scoring::{
    parse_timestamp, recency_multiplier, score, score_now, RawScale, RuleTable,
    ScoringRule,
};
pub use crate::analyze::weights::WeightConfig;

/// Scored items plus ranked hotspots from one pass.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub scored: Vec<ScoredItem>,
    pub hotspots: Vec<HotspotBucket>,
}

/// Score then aggregate against a single reference instant.
pub fn analyze(
    items: Vec<Item>,
    weights: &WeightConfig,
    whitelist: &[String],
    now: DateTime<Utc>,
) -> Analysis {
    let scored = score(items, weights, now);
    let hotspots = aggregate(&scored, whitelist);
    tracing::debug!(
        scored = scored.len(),
        hotspots = hotspots.len(),
        "analysis finished"
    );
    Analysis { scored, hotspots }
}
