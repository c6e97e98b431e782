// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Which upstream family an item came from. Selects the scoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Trend,
    SocialPost,
    CommunityPost,
    LaunchFeed,
    /// Unrecognized source name, kept verbatim (lower-cased).
    Other(String),
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Trend => "trend",
            Source::SocialPost => "social_post",
            Source::CommunityPost => "community_post",
            Source::LaunchFeed => "launch_feed",
            Source::Other(s) => s.as_str(),
        }
    }

    /// Parse a source name; accepts the upstream aliases used by older exports.
    pub fn parse(s: &str) -> Self {
        let k = s.trim().to_ascii_lowercase();
        match k.as_str() {
            "trend" | "google_trends" => Source::Trend,
            "social_post" | "twitter" => Source::SocialPost,
            "community_post" | "social_feed" | "reddit" => Source::CommunityPost,
            "launch_feed" | "pumpfun" => Source::LaunchFeed,
            _ => Source::Other(k),
        }
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Source::parse(&s)
    }
}

impl From<Source> for String {
    fn from(s: Source) -> Self {
        s.as_str().to_string()
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Other(String::new())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform record every provider emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "loose_f64")]
    pub score_raw: f64,
    /// ISO-8601; empty or garbage means "unknown time".
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: BTreeMap<String, Value>,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Numbers, numeric strings, or anything else as 0.
fn loose_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if v.is_finite() { v } else { 0.0 })
}

impl Item {
    pub fn new(source: Source, title: impl Into<String>) -> Self {
        Self {
            source,
            title: title.into(),
            url: String::new(),
            score_raw: 0.0,
            timestamp: String::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn score_raw(mut self, v: f64) -> Self {
        self.score_raw = v;
        self
    }

    pub fn timestamp(mut self, ts: impl Into<String>) -> Self {
        self.timestamp = ts.into();
        self
    }

    pub fn meta(mut self, key: &str, v: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), v.into());
        self
    }
}

/// Item after recency-weighted scoring. Original fields are untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: Item,
    pub score: f64,
}

/// Per-provider result of one ingest pass.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub provider: &'static str,
    pub result: FetchResult,
}

#[derive(Debug, Clone)]
pub enum FetchResult {
    Fetched { items: usize },
    Failed { error: String },
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.result, FetchResult::Failed { .. })
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<Item>>;
    fn name(&self) -> &'static str;
}
