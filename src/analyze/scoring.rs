//! Per-item scoring: source-specific base score times a recency decay.
//!
//! base    = raw term (score_raw * scale, or score_raw / divisor) + sum(meta[field] * scale)
//! recency = 2^(-age_hours / half_life)
//! score   = base * recency
//!
//! The reference instant `now` is passed in so one run scores every item against the
//! same clock reading.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;

use super::WeightConfig;
use crate::ingest::types::{Item, ScoredItem, Source};

/// How the raw metric enters the base score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RawScale {
    Mul(f64),
    /// `score_raw / d`; kept apart from `Mul(1/d)` so the result rounds the same way.
    Div(f64),
}

impl RawScale {
    fn apply(self, raw: f64) -> f64 {
        match self {
            RawScale::Mul(k) => raw * k,
            RawScale::Div(d) if d != 0.0 => raw / d,
            RawScale::Div(_) => 0.0,
        }
    }
}

/// Linear rule over the raw metric and selected meta fields.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringRule {
    pub raw_scale: RawScale,
    pub meta_terms: Vec<(&'static str, f64)>,
}

impl ScoringRule {
    pub fn raw(scale: f64) -> Self {
        Self {
            raw_scale: RawScale::Mul(scale),
            meta_terms: Vec::new(),
        }
    }

    pub fn per(divisor: f64) -> Self {
        Self {
            raw_scale: RawScale::Div(divisor),
            meta_terms: Vec::new(),
        }
    }

    pub fn meta(terms: Vec<(&'static str, f64)>) -> Self {
        Self {
            raw_scale: RawScale::Mul(0.0),
            meta_terms: terms,
        }
    }

    pub fn base(&self, item: &Item) -> f64 {
        let mut acc = self.raw_scale.apply(finite_or_zero(item.score_raw));
        for (field, scale) in &self.meta_terms {
            acc += meta_number(item, field) * scale;
        }
        finite_or_zero(acc)
    }
}

/// Source → rule mapping built once per scoring call.
#[derive(Clone, Debug)]
pub struct RuleTable {
    rules: BTreeMap<Source, ScoringRule>,
    fallback: ScoringRule,
}

impl RuleTable {
    pub fn from_weights(w: &WeightConfig) -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(Source::Trend, ScoringRule::per(100.0));
        rules.insert(
            Source::CommunityPost,
            ScoringRule::raw(w.community_upvote_scale),
        );
        rules.insert(
            Source::SocialPost,
            ScoringRule::meta(vec![
                ("likes", w.social_like_scale),
                ("retweets", w.social_retweet_scale),
            ]),
        );
        rules.insert(Source::LaunchFeed, ScoringRule::per(100.0));
        Self {
            rules,
            fallback: ScoringRule::per(100.0),
        }
    }

    pub fn rule_for(&self, source: &Source) -> &ScoringRule {
        self.rules.get(source).unwrap_or(&self.fallback)
    }
}

/// Score every item against `now`. Same length and order as the input.
pub fn score(items: Vec<Item>, w: &WeightConfig, now: DateTime<Utc>) -> Vec<ScoredItem> {
    let table = RuleTable::from_weights(w);
    items
        .into_iter()
        .map(|item| {
            let base = table.rule_for(&item.source).base(&item);
            let recency = recency_multiplier(&item.timestamp, now, w.recency_hours_half_life);
            ScoredItem {
                score: base * recency,
                item,
            }
        })
        .collect()
}

/// Convenience wrapper that samples the wall clock once.
pub fn score_now(items: Vec<Item>, w: &WeightConfig) -> Vec<ScoredItem> {
    score(items, w, Utc::now())
}

/// `2^(-hours/half_life)`; 1.0 for unparseable timestamps or a degenerate half-life.
pub fn recency_multiplier(ts: &str, now: DateTime<Utc>, half_life_hours: f64) -> f64 {
    if !(half_life_hours.is_finite() && half_life_hours > 0.0) {
        return 1.0;
    }
    let Some(t) = parse_timestamp(ts) else {
        return 1.0;
    };
    let hours = age_hours(now, t);
    let m = (-hours / half_life_hours).exp2();
    if m.is_finite() {
        m
    } else {
        1.0
    }
}

/// ISO-8601 into a UTC instant. Naive date-times are read as UTC.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let s = ts.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn age_hours(now: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    let d = now.signed_duration_since(t);
    match d.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => d.num_seconds() as f64 / 3_600.0,
    }
}

fn meta_number(item: &Item, field: &str) -> f64 {
    let v = match item.meta.get(field) {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    finite_or_zero(v)
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}
