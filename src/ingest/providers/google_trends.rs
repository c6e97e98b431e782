// src/ingest/providers/google_trends.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ingest::types::{Item, Source, SourceProvider};
use crate::ingest::{normalize_title, now_iso};

pub const DEFAULT_BASE: &str = "https://trends.google.com/trends";
const HL: &str = "en-US";
const TZ: &str = "360";
const TIMEFRAME: &str = "now 1-d";
const SEGMENTS: [&str; 2] = ["top", "rising"];

#[derive(Debug, Deserialize)]
struct Explore {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Widget {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub request: Value,
}

impl Widget {
    /// Seed keyword this related-queries widget belongs to.
    pub fn keyword(&self) -> Option<&str> {
        self.request
            .pointer("/restriction/complexKeywordsRestriction/keyword/0/value")
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct Related {
    default: RelatedDefault,
}
#[derive(Debug, Deserialize)]
struct RelatedDefault {
    #[serde(rename = "rankedList", default)]
    ranked_list: Vec<RankedList>,
}
#[derive(Debug, Deserialize)]
struct RankedList {
    #[serde(rename = "rankedKeyword", default)]
    ranked_keyword: Vec<RankedKeyword>,
}
#[derive(Debug, Deserialize)]
struct RankedKeyword {
    #[serde(default)]
    query: String,
    #[serde(default)]
    value: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct TrendsQuery {
    pub regions: Vec<String>,
    pub kw_seed: Vec<String>,
    pub top_n: usize,
}

/// Related queries for seed keywords, per region.
pub struct GoogleTrendsProvider {
    mode: Mode,
    query: TrendsQuery,
    base: String,
}

enum Mode {
    /// (region, seed keyword, relatedsearches body)
    Fixture(Vec<(String, String, String)>),
    Http { client: reqwest::Client },
}

impl GoogleTrendsProvider {
    pub fn from_fixture_str(region: &str, seed: &str, body: &str, top_n: usize) -> Self {
        Self {
            mode: Mode::Fixture(vec![(region.into(), seed.into(), body.into())]),
            query: TrendsQuery {
                regions: vec![region.into()],
                kw_seed: vec![seed.into()],
                top_n,
            },
            base: DEFAULT_BASE.to_string(),
        }
    }

    /// `client` needs a cookie store: Trends rejects calls without the session cookie.
    pub fn from_client(client: reqwest::Client, query: TrendsQuery) -> Self {
        Self {
            mode: Mode::Http { client },
            query,
            base: DEFAULT_BASE.to_string(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Landing page that hands out the `NID` session cookie.
    pub fn session_url(&self) -> String {
        let geo = HL.rsplit('-').next().unwrap_or("US");
        format!("{}/?geo={geo}", self.base)
    }

    async fn open_session(&self, client: &reqwest::Client) -> Result<()> {
        client
            .get(self.session_url())
            .send()
            .await
            .context("trends session get()")?
            .error_for_status()
            .context("trends session non-2xx")?;
        Ok(())
    }

    async fn region_items(
        &self,
        client: &reqwest::Client,
        region: &str,
        fetched_at: &str,
    ) -> Result<Vec<Item>> {
        let items: Vec<Value> = self
            .query
            .kw_seed
            .iter()
            .map(|kw| json!({"keyword": kw, "geo": region, "time": TIMEFRAME}))
            .collect();
        let req = json!({"comparisonItem": items, "category": 0, "property": ""}).to_string();

        let body = client
            .get(format!("{}/api/explore", self.base))
            .query(&[("hl", HL), ("tz", TZ), ("req", req.as_str())])
            .send()
            .await
            .context("trends explore get()")?
            .error_for_status()
            .context("trends explore non-2xx")?
            .text()
            .await
            .context("trends explore .text()")?;

        let mut out = Vec::new();
        for w in related_query_widgets(&body)? {
            let Some(seed) = w.keyword().map(str::to_string) else {
                continue;
            };
            let wreq = w.request.to_string();
            let body = client
                .get(format!("{}/api/widgetdata/relatedsearches", self.base))
                .query(&[
                    ("hl", HL),
                    ("tz", TZ),
                    ("req", wreq.as_str()),
                    ("token", w.token.as_str()),
                ])
                .send()
                .await
                .context("trends relatedsearches get()")?
                .error_for_status()
                .context("trends relatedsearches non-2xx")?
                .text()
                .await
                .context("trends relatedsearches .text()")?;
            out.extend(parse_related(&body, region, &seed, self.query.top_n, fetched_at)?);
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GoogleTrendsProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        let fetched_at = now_iso();
        match &self.mode {
            Mode::Fixture(bodies) => {
                let mut out = Vec::new();
                for (region, seed, body) in bodies {
                    out.extend(parse_related(body, region, seed, self.query.top_n, &fetched_at)?);
                }
                Ok(out)
            }
            Mode::Http { client } => {
                if let Err(e) = self.open_session(client).await {
                    tracing::warn!(error = ?e, provider = "google_trends", "no session cookie, trying anyway");
                }
                let mut out = Vec::new();
                let mut failures = 0usize;
                for region in &self.query.regions {
                    match self.region_items(client, region, &fetched_at).await {
                        Ok(v) => out.extend(v),
                        Err(e) => {
                            failures += 1;
                            tracing::warn!(error = ?e, provider = "google_trends", region = %region, "region fetch failed");
                        }
                    }
                }
                if failures > 0 && failures == self.query.regions.len() {
                    return Err(anyhow!("all {failures} region fetches failed"));
                }
                Ok(out)
            }
        }
    }

    fn name(&self) -> &'static str {
        "google_trends"
    }
}

/// Drop the `)]}'` guard line Google prepends to its JSON.
pub fn strip_guard(body: &str) -> &str {
    let s = body.trim_start();
    match s.strip_prefix(")]}'") {
        Some(rest) => rest.trim_start_matches(',').trim_start(),
        None => s,
    }
}

/// Related-queries widgets from an explore response.
pub fn related_query_widgets(body: &str) -> Result<Vec<Widget>> {
    let e: Explore = serde_json::from_str(strip_guard(body)).context("parsing trends explore json")?;
    Ok(e
        .widgets
        .into_iter()
        .filter(|w| w.id.starts_with("RELATED_QUERIES"))
        .collect())
}

/// Items from a relatedsearches response: ranked list 0 is "top", 1 is "rising".
pub fn parse_related(
    body: &str,
    region: &str,
    seed: &str,
    top_n: usize,
    fetched_at: &str,
) -> Result<Vec<Item>> {
    let r: Related = serde_json::from_str(strip_guard(body)).context("parsing trends related json")?;
    let mut out = Vec::new();
    for (segment, list) in SEGMENTS.iter().zip(r.default.ranked_list) {
        for kw in list.ranked_keyword.into_iter().take(top_n) {
            let phrase = normalize_title(&kw.query);
            if phrase.is_empty() {
                continue;
            }
            let url = reqwest::Url::parse_with_params(
                "https://trends.google.com/trends/explore",
                &[("geo", region), ("q", phrase.as_str())],
            )
            .map(String::from)
            .unwrap_or_default();
            out.push(
                Item::new(Source::Trend, phrase)
                    .url(url)
                    .score_raw(kw.value.filter(|v| v.is_finite()).unwrap_or(0.0))
                    .timestamp(fetched_at)
                    .meta("segment", *segment)
                    .meta("seed_kw", seed)
                    .meta("region", region),
            );
        }
    }
    Ok(out)
}
