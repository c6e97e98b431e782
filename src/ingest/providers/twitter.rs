// src/ingest/providers/twitter.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::ingest::normalize_title;
use crate::ingest::types::{Item, Source, SourceProvider};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tweet {
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default)]
    retweet_count: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct TwitterQuery {
    pub kw_any: Vec<String>,
    pub lookback_hours: u32,
    pub max_results: u32,
    pub top_n: usize,
}

impl TwitterQuery {
    /// `(k1 OR "two words") lang:en since:YYYY-MM-DD`
    pub fn search_string(&self, now: DateTime<Utc>) -> String {
        let since = (now - Duration::hours(i64::from(self.lookback_hours))).format("%Y-%m-%d");
        let ors = self
            .kw_any
            .iter()
            .map(|k| {
                if k.contains(char::is_whitespace) {
                    format!("\"{}\"", k.replace('"', ""))
                } else {
                    k.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("({ors}) lang:en since:{since}")
    }
}

/// Social posts scraped through the `snscrape` CLI.
pub struct TwitterProvider {
    mode: Mode,
    query: TwitterQuery,
}

enum Mode {
    Fixture(String),
    Command { program: String },
}

impl TwitterProvider {
    pub fn from_fixture_str(jsonl: &str, query: TwitterQuery) -> Self {
        Self {
            mode: Mode::Fixture(jsonl.to_string()),
            query,
        }
    }

    pub fn from_command(program: impl Into<String>, query: TwitterQuery) -> Self {
        Self {
            mode: Mode::Command {
                program: program.into(),
            },
            query,
        }
    }

    async fn run_scraper(&self, program: &str) -> Result<String> {
        let search = self.query.search_string(Utc::now());
        tracing::debug!(provider = "twitter", %search, "running scraper");
        let out = tokio::process::Command::new(program)
            .arg("--jsonl")
            .arg("--max-results")
            .arg(self.query.max_results.to_string())
            .arg("twitter-search")
            .arg(&search)
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawning {program}"))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(anyhow!("{program} exited with {}: {}", out.status, stderr.trim()));
        }
        String::from_utf8(out.stdout).context("scraper output is not utf-8")
    }
}

#[async_trait]
impl SourceProvider for TwitterProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        let body = match &self.mode {
            Mode::Fixture(s) => s.clone(),
            Mode::Command { program } => self.run_scraper(program).await?,
        };
        Ok(parse_jsonl(&body, self.query.top_n))
    }

    fn name(&self) -> &'static str {
        "twitter"
    }
}

/// One tweet per JSON line; malformed lines are skipped. Keeps the `top_n` most engaged.
pub fn parse_jsonl(body: &str, top_n: usize) -> Vec<Item> {
    let mut out: Vec<Item> = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| match serde_json::from_str::<Tweet>(l) {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed tweet line");
                None
            }
        })
        .map(|t| {
            let text = t.raw_content.or(t.content).unwrap_or_default();
            let likes = t.like_count.unwrap_or(0);
            let retweets = t.retweet_count.unwrap_or(0);
            Item::new(Source::SocialPost, normalize_title(&text))
                .url(t.url)
                .score_raw(likes.saturating_add(retweets.saturating_mul(2)) as f64)
                .timestamp(t.date)
                .meta("likes", likes)
                .meta("retweets", retweets)
        })
        .collect();
    out.sort_by(|a, b| b.score_raw.total_cmp(&a.score_raw));
    out.truncate(top_n);
    out
}
