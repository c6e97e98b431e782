//! # Run Engine
//! Wires one pass: providers → scoring → aggregation → pair mapping → export.
//!
//! Provider construction reads the run config and the environment; everything after
//! ingest works on in-memory data with a single `now`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::analyze::{self, HotspotBucket};
use crate::config::HotspotConfig;
use crate::export::{self, ExportPaths};
use crate::ingest::providers::google_trends::{GoogleTrendsProvider, TrendsQuery};
use crate::ingest::providers::pumpfun::{self, PumpFunProvider};
use crate::ingest::providers::reddit::{RedditFilter, RedditProvider, DEFAULT_USER_AGENT};
use crate::ingest::providers::twitter::{TwitterProvider, TwitterQuery};
use crate::ingest::types::{FetchOutcome, Item, ScoredItem, SourceProvider};
use crate::mapping::{self, MappingFilter, PairMatch, PairSearch};

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub now: DateTime<Utc>,
    pub outcomes: Vec<FetchOutcome>,
    pub scored: Vec<ScoredItem>,
    pub hotspots: Vec<HotspotBucket>,
    pub mappings: Vec<PairMatch>,
}

impl RunReport {
    pub fn failed_sources(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_failed())
            .map(|o| o.provider)
            .collect()
    }
}

/// Providers enabled in `cfg`, in a fixed order.
pub fn build_providers(cfg: &HotspotConfig, client: &reqwest::Client) -> Vec<Box<dyn SourceProvider>> {
    let s = &cfg.sources;
    let run = &cfg.run;
    let mut out: Vec<Box<dyn SourceProvider>> = Vec::new();

    if s.google_trends.enabled {
        out.push(Box::new(GoogleTrendsProvider::from_client(
            client.clone(),
            TrendsQuery {
                regions: s.google_trends.regions.clone(),
                kw_seed: s.google_trends.kw_seed.clone(),
                top_n: run.top_n,
            },
        )));
    }
    if s.reddit.enabled {
        out.push(Box::new(RedditProvider::from_env(
            client.clone(),
            RedditFilter {
                subreddits: s.reddit.subreddits.clone(),
                min_upvotes: s.reddit.min_upvotes,
                lookback_hours: run.lookback_hours,
                top_n: run.top_n,
            },
        )));
    }
    if s.twitter.enabled {
        out.push(Box::new(TwitterProvider::from_command(
            s.twitter.scraper.clone(),
            TwitterQuery {
                kw_any: s.twitter.kw_any.clone(),
                lookback_hours: run.lookback_hours,
                max_results: s.twitter.max_results,
                top_n: run.top_n,
            },
        )));
    }
    if s.pumpfun.enabled {
        out.push(Box::new(
            PumpFunProvider::from_url(pumpfun::DEFAULT_API, client.clone(), s.pumpfun.limit)
                .with_keywords(s.pumpfun.kw_any.clone()),
        ));
    }
    out
}

/// User agent for upstream calls; Reddit requires a descriptive one.
pub fn user_agent() -> String {
    std::env::var("REDDIT_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string())
}

/// Score, aggregate and (optionally) map already-fetched items.
pub async fn process(
    cfg: &HotspotConfig,
    items: Vec<Item>,
    outcomes: Vec<FetchOutcome>,
    search: Option<&dyn PairSearch>,
    now: DateTime<Utc>,
) -> RunReport {
    let analysis = analyze::analyze(
        items,
        &cfg.scoring.weights,
        &cfg.filters.whitelist_any,
        now,
    );

    let dex = &cfg.mapping.dexscreener;
    let mappings = match search {
        Some(s) if dex.enabled => {
            let keywords = mapping::top_keywords(&analysis.hotspots, dex.max_keywords);
            let filter = MappingFilter {
                chains: dex.chains.clone(),
                min_liquidity_usd: dex.min_liquidity_usd,
            };
            mapping::map_keywords_to_pairs(s, &keywords, &filter).await
        }
        _ => Vec::new(),
    };

    RunReport {
        now,
        outcomes,
        scored: analysis.scored,
        hotspots: analysis.hotspots,
        mappings,
    }
}

/// Full pass against the live upstream services.
pub async fn run(cfg: &HotspotConfig) -> Result<RunReport> {
    let client = crate::ingest::http_client(&user_agent())?;
    let providers = build_providers(cfg, &client);
    tracing::info!(providers = providers.len(), "starting hotspot pass");

    let (items, outcomes) = crate::ingest::run_once(&providers).await;
    let dex = mapping::DexScreenerClient::new(client);
    let report = process(cfg, items, outcomes, Some(&dex as &dyn PairSearch), Utc::now()).await;

    log_summary(&report);
    Ok(report)
}

/// Write the report artifacts into `out_dir`.
pub fn export_report(report: &RunReport, out_dir: &Path) -> Result<ExportPaths> {
    export::write_all(out_dir, &report.scored, &report.hotspots, &report.mappings)
}

fn log_summary(report: &RunReport) {
    let failed = report.failed_sources();
    if !failed.is_empty() {
        tracing::warn!(?failed, "some sources failed this run");
    }
    tracing::info!(
        items = report.scored.len(),
        hotspots = report.hotspots.len(),
        mappings = report.mappings.len(),
        "hotspot pass finished"
    );
}
