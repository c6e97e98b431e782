//! Scoring weights, read from the `[scoring.weights]` table of the run config.
//!
//! ```toml
//! [scoring.weights]
//! recency_hours_half_life = 24
//! social_like_scale = 0.001
//! social_retweet_scale = 0.002
//! community_upvote_scale = 0.002
//! ```
//!
//! The older `twitter_*` / `reddit_*` key names are accepted as aliases.

use serde::{Deserialize, Serialize};

pub const DEFAULT_HALF_LIFE_HOURS: f64 = 24.0;

fn default_half_life() -> f64 {
    DEFAULT_HALF_LIFE_HOURS
}
fn default_like_scale() -> f64 {
    0.001
}
fn default_retweet_scale() -> f64 {
    0.002
}
fn default_upvote_scale() -> f64 {
    0.002
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    #[serde(default = "default_half_life")]
    pub recency_hours_half_life: f64,
    #[serde(default = "default_like_scale", alias = "twitter_like_scale")]
    pub social_like_scale: f64,
    #[serde(default = "default_retweet_scale", alias = "twitter_retweet_scale")]
    pub social_retweet_scale: f64,
    #[serde(default = "default_upvote_scale", alias = "reddit_upvote_scale")]
    pub community_upvote_scale: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            recency_hours_half_life: default_half_life(),
            social_like_scale: default_like_scale(),
            social_retweet_scale: default_retweet_scale(),
            community_upvote_scale: default_upvote_scale(),
        }
    }
}

impl WeightConfig {
    /// Reset values that would make decay meaningless. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        if self.recency_hours_half_life.is_finite() && self.recency_hours_half_life > 0.0 {
            return false;
        }
        tracing::warn!(
            half_life = self.recency_hours_half_life,
            "invalid recency_hours_half_life, using default"
        );
        self.recency_hours_half_life = DEFAULT_HALF_LIFE_HOURS;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let w: WeightConfig = serde_json::from_str(r#"{"social_like_scale":0.5}"#).unwrap();
        assert_eq!(w.social_like_scale, 0.5);
        assert_eq!(w.recency_hours_half_life, 24.0);
        assert_eq!(w.community_upvote_scale, 0.002);
    }

    #[test]
    fn legacy_key_names_are_accepted() {
        let w: WeightConfig = serde_json::from_str(
            r#"{"twitter_like_scale":0.01,"twitter_retweet_scale":0.02,"reddit_upvote_scale":0.03}"#,
        )
        .unwrap();
        assert_eq!(w.social_like_scale, 0.01);
        assert_eq!(w.social_retweet_scale, 0.02);
        assert_eq!(w.community_upvote_scale, 0.03);
    }

    #[test]
    fn non_positive_half_life_is_reset() {
        let mut w = WeightConfig {
            recency_hours_half_life: 0.0,
            ..WeightConfig::default()
        };
        assert!(w.sanitize());
        assert_eq!(w.recency_hours_half_life, DEFAULT_HALF_LIFE_HOURS);
        assert!(!w.sanitize());
    }
}
