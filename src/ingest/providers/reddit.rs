// src/ingest/providers/reddit.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::ingest::normalize_title;
use crate::ingest::types::{Item, Source, SourceProvider};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
pub const DEFAULT_USER_AGENT: &str = "hotspot-mapper/0.1";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}
#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}
#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}
#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: Option<f64>,
    #[serde(default)]
    num_comments: u64,
}

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
}

#[derive(Clone, Debug)]
pub struct RedditFilter {
    pub subreddits: Vec<String>,
    pub min_upvotes: i64,
    pub lookback_hours: u32,
    pub top_n: usize,
}

#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl RedditCredentials {
    /// `None` if either variable is unset or blank.
    pub fn from_env() -> Option<Self> {
        let id = std::env::var("REDDIT_CLIENT_ID").ok()?;
        let secret = std::env::var("REDDIT_CLIENT_SECRET").ok()?;
        if id.trim().is_empty() || secret.trim().is_empty() {
            return None;
        }
        Some(Self {
            client_id: id,
            client_secret: secret,
        })
    }
}

/// Hot posts from a set of subreddits.
pub struct RedditProvider {
    mode: Mode,
    filter: RedditFilter,
}

enum Mode {
    /// (subreddit, listing body)
    Fixture(Vec<(String, String)>),
    Http {
        client: reqwest::Client,
        credentials: Option<RedditCredentials>,
    },
}

impl RedditProvider {
    pub fn from_fixture_str(subreddit: &str, body: &str, filter: RedditFilter) -> Self {
        Self {
            mode: Mode::Fixture(vec![(subreddit.to_string(), body.to_string())]),
            filter,
        }
    }

    pub fn from_env(client: reqwest::Client, filter: RedditFilter) -> Self {
        Self {
            mode: Mode::Http {
                client,
                credentials: RedditCredentials::from_env(),
            },
            filter,
        }
    }

    async fn token(client: &reqwest::Client, c: &RedditCredentials) -> Result<String> {
        let t: Token = client
            .post(TOKEN_URL)
            .basic_auth(&c.client_id, Some(&c.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("reddit token request")?
            .error_for_status()
            .context("reddit token non-2xx")?
            .json()
            .await
            .context("reddit token json")?;
        Ok(t.access_token)
    }

    async fn hot(client: &reqwest::Client, token: &str, sub: &str, limit: usize) -> Result<String> {
        let limit = limit.to_string();
        client
            .get(format!("{API_BASE}/r/{sub}/hot"))
            .bearer_auth(token)
            .query(&[("limit", limit.as_str())])
            .send()
            .await
            .with_context(|| format!("reddit r/{sub} get()"))?
            .error_for_status()
            .with_context(|| format!("reddit r/{sub} non-2xx"))?
            .text()
            .await
            .with_context(|| format!("reddit r/{sub} .text()"))
    }
}

#[async_trait]
impl SourceProvider for RedditProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        let now = Utc::now();
        match &self.mode {
            Mode::Fixture(bodies) => {
                let mut out = Vec::new();
                for (sub, body) in bodies {
                    out.extend(parse_listing(body, sub, now, &self.filter)?);
                }
                Ok(out)
            }
            Mode::Http {
                client,
                credentials,
            } => {
                let creds = credentials
                    .as_ref()
                    .ok_or_else(|| anyhow!("REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET not set"))?;
                let token = Self::token(client, creds).await?;

                let mut out = Vec::new();
                let mut failures = 0usize;
                for sub in &self.filter.subreddits {
                    let limit = listing_limit(self.filter.top_n);
                    let res = Self::hot(client, &token, sub, limit)
                        .await
                        .and_then(|b| parse_listing(&b, sub, now, &self.filter));
                    match res {
                        Ok(v) => out.extend(v),
                        Err(e) => {
                            failures += 1;
                            tracing::warn!(error = ?e, provider = "reddit", subreddit = %sub, "subreddit fetch failed");
                        }
                    }
                }
                if failures > 0 && failures == self.filter.subreddits.len() {
                    return Err(anyhow!("all {failures} subreddit fetches failed"));
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

/// Posts requested per subreddit; over-fetch since filtering drops many.
fn listing_limit(top_n: usize) -> usize {
    top_n.saturating_mul(5).max(1)
}

/// Parse a `/hot` listing, keeping recent posts above the upvote floor.
pub fn parse_listing(
    body: &str,
    subreddit: &str,
    now: DateTime<Utc>,
    filter: &RedditFilter,
) -> Result<Vec<Item>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit listing json")?;
    let since = now - Duration::hours(i64::from(filter.lookback_hours));

    let mut out = Vec::new();
    for Child { data: post } in listing.data.children {
        let created = post
            .created_utc
            .and_then(|t| DateTime::from_timestamp(t.trunc() as i64, 0));
        if matches!(created, Some(c) if c < since) {
            continue;
        }
        if post.score < filter.min_upvotes {
            continue;
        }
        let title = normalize_title(&post.title);
        if title.is_empty() {
            continue;
        }
        out.push(
            Item::new(Source::CommunityPost, title)
                .url(format!("https://www.reddit.com{}", post.permalink))
                .score_raw(post.score as f64)
                .timestamp(
                    created
                        .map(|c| c.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                        .unwrap_or_default(),
                )
                .meta("num_comments", post.num_comments)
                .meta("subreddit", subreddit),
        );
    }
    Ok(out)
}
