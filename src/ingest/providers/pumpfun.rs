// src/ingest/providers/pumpfun.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

use crate::ingest::types::{Item, Source, SourceProvider};
use crate::ingest::{normalize_title, now_iso};

pub const DEFAULT_API: &str = "https://frontend-api.pump.fun/projects";

/// Sort orders queried to widen coverage of the unofficial endpoint.
const SORTS: [&str; 3] = ["createdAt", "marketCap", "holders"];

/// Recent token launches from Pump.fun.
pub struct PumpFunProvider {
    mode: Mode,
    limit: u32,
    kw_any: Vec<String>,
}

enum Mode {
    Fixture(Vec<String>),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl PumpFunProvider {
    /// Parse captured response bodies instead of calling the API.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(vec![s.to_string()]),
            limit: 0,
            kw_any: Vec::new(),
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client, limit: u32) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
            limit,
            kw_any: Vec::new(),
        }
    }

    /// Keep only launches whose title or description contains one of these terms.
    pub fn with_keywords(mut self, kw_any: Vec<String>) -> Self {
        self.kw_any = kw_any.into_iter().map(|k| k.to_lowercase()).collect();
        self
    }

    async fn fetch_sort(client: &reqwest::Client, url: &str, limit: u32, sort: &str) -> Result<String> {
        let limit = limit.to_string();
        client
            .get(url)
            .query(&[("offset", "0"), ("limit", limit.as_str()), ("sort", sort)])
            .send()
            .await
            .context("pumpfun http get()")?
            .error_for_status()
            .context("pumpfun non-2xx")?
            .text()
            .await
            .context("pumpfun http .text()")
    }
}

#[async_trait]
impl SourceProvider for PumpFunProvider {
    async fn fetch_latest(&self) -> Result<Vec<Item>> {
        let fetched_at = now_iso();
        let mut out = Vec::new();
        match &self.mode {
            Mode::Fixture(bodies) => {
                for b in bodies {
                    out.extend(parse_projects(b, &self.kw_any, &fetched_at)?);
                }
            }
            Mode::Http { url, client } => {
                let mut last_err = None;
                let mut ok_any = false;
                for sort in SORTS {
                    let parsed = Self::fetch_sort(client, url, self.limit, sort)
                        .await
                        .and_then(|b| parse_projects(&b, &self.kw_any, &fetched_at));
                    match parsed {
                        Ok(v) => {
                            ok_any = true;
                            out.extend(v);
                        }
                        Err(e) => {
                            tracing::warn!(error = ?e, provider = "pumpfun", sort, "sort query failed");
                            last_err = Some(e);
                        }
                    }
                }
                if let (false, Some(e)) = (ok_any, last_err) {
                    return Err(e);
                }
            }
        }
        Ok(dedup_and_rank(out))
    }

    fn name(&self) -> &'static str {
        "pumpfun"
    }
}

/// Parse one `/projects` response. Accepts `{projects: [...]}`, `{data: [...]}` or a bare array.
pub fn parse_projects(body: &str, kw_any: &[String], fetched_at: &str) -> Result<Vec<Item>> {
    let v: Value = serde_json::from_str(body).context("parsing pumpfun json")?;
    let projects = match &v {
        Value::Array(a) => a.as_slice(),
        Value::Object(o) => o
            .get("projects")
            .or_else(|| o.get("data"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let mut out = Vec::with_capacity(projects.len());
    for p in projects {
        let name = str_field(p, "name");
        let symbol = str_field(p, "symbol");
        let title = match (name.is_empty(), symbol.is_empty()) {
            (false, false) => format!("{name} ({symbol})"),
            (false, true) => name.clone(),
            (true, false) => symbol.clone(),
            (true, true) => continue,
        };
        let title = normalize_title(&title);

        if !kw_any.is_empty() {
            let t = title.to_lowercase();
            let desc = str_field(p, "description").to_lowercase();
            if !kw_any.iter().any(|k| t.contains(k.as_str()) || desc.contains(k.as_str())) {
                continue;
            }
        }

        let mint = p.get("mint").and_then(Value::as_str).map(str::to_string);
        let marketcap = p
            .get("marketCapUsd")
            .filter(|v| !v.is_null())
            .or_else(|| p.get("marketCap"))
            .cloned()
            .unwrap_or(Value::Null);

        let url = match &mint {
            Some(m) => format!("https://pump.fun/coin/{m}"),
            None => "https://pump.fun".to_string(),
        };

        out.push(
            Item::new(Source::LaunchFeed, title)
                .url(url)
                .score_raw(number(&marketcap).trunc())
                .timestamp(created_at(p.get("createdAt").or_else(|| p.get("created_at")), fetched_at))
                .meta("mint", mint.map(Value::String).unwrap_or(Value::Null))
                .meta("marketcap_usd", marketcap)
                .meta("holders", p.get("holders").cloned().unwrap_or(Value::Null))
                .meta(
                    "raydium_pool",
                    p.get("raydiumPool").cloned().unwrap_or(Value::Null),
                ),
        );
    }
    Ok(out)
}

/// Drop launches without a mint, keep the first of each mint, order by market cap.
pub fn dedup_and_rank(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut uniq: Vec<Item> = items
        .into_iter()
        .filter(|it| match it.meta.get("mint").and_then(Value::as_str) {
            Some(m) if !m.is_empty() => seen.insert(m.to_string()),
            _ => false,
        })
        .collect();
    uniq.sort_by(|a, b| b.score_raw.total_cmp(&a.score_raw));
    uniq
}

fn str_field(p: &Value, key: &str) -> String {
    p.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// `createdAt` may be epoch millis, epoch seconds, or a string.
fn created_at(v: Option<&Value>, fetched_at: &str) -> String {
    match v {
        Some(Value::Number(n)) => {
            let raw = n.as_f64().unwrap_or(0.0);
            let secs = if raw > 1e12 { raw / 1000.0 } else { raw };
            chrono::DateTime::from_timestamp(secs.trunc() as i64, 0)
                .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
                .unwrap_or_else(|| fetched_at.to_string())
        }
        Some(Value::String(s)) => s.clone(),
        _ => fetched_at.to_string(),
    }
}
