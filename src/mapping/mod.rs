// src/mapping/mod.rs
//! Hotspot keyword → on-chain pair lookup.

pub mod dexscreener;

use anyhow::Result;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::analyze::HotspotBucket;
pub use dexscreener::{DexPair, DexScreenerClient};

#[async_trait::async_trait]
pub trait PairSearch: Send + Sync {
    async fn search(&self, keyword: &str) -> Result<Vec<DexPair>>;
}

/// Flattened pair record written to `dex_mappings.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairMatch {
    pub keyword: String,
    pub chain: Option<String>,
    pub dex_id: Option<String>,
    pub pair_address: Option<String>,
    pub base_token: Option<String>,
    pub base_name: Option<String>,
    pub fdv: Option<f64>,
    pub liquidity_usd: f64,
    pub price_usd: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct MappingFilter {
    /// Empty means any chain.
    pub chains: Vec<String>,
    pub min_liquidity_usd: f64,
}

impl MappingFilter {
    pub fn accepts(&self, pair: &DexPair) -> bool {
        if !self.chains.is_empty() {
            let Some(chain) = pair.chain_id.as_deref() else {
                return false;
            };
            if !self.chains.iter().any(|c| c == chain) {
                return false;
            }
        }
        pair.liquidity_usd() >= self.min_liquidity_usd
    }
}

/// Keywords of the first `n` ranked buckets.
pub fn top_keywords(hotspots: &[HotspotBucket], n: usize) -> Vec<String> {
    hotspots.iter().take(n).map(|h| h.keyword.clone()).collect()
}

/// Apply the chain/liquidity filter to one keyword's search results.
pub fn filter_pairs(keyword: &str, pairs: Vec<DexPair>, filter: &MappingFilter) -> Vec<PairMatch> {
    pairs
        .into_iter()
        .filter(|p| filter.accepts(p))
        .map(|p| {
            let liquidity_usd = p.liquidity_usd();
            let (base_token, base_name) = match p.base_token {
                Some(t) => (t.symbol, t.name),
                None => (None, None),
            };
            PairMatch {
                keyword: keyword.to_string(),
                chain: p.chain_id,
                dex_id: p.dex_id,
                pair_address: p.pair_address,
                base_token,
                base_name,
                fdv: p.fdv,
                liquidity_usd,
                price_usd: p.price_usd,
                url: p.url,
                created_at: p.pair_created_at,
            }
        })
        .collect()
}

/// Look up each keyword in order. A failed lookup is logged and skipped.
pub async fn map_keywords_to_pairs<S: PairSearch + ?Sized>(
    search: &S,
    keywords: &[String],
    filter: &MappingFilter,
) -> Vec<PairMatch> {
    crate::ingest::ensure_metrics_described();

    let mut out = Vec::new();
    for kw in keywords {
        counter!("mapping_lookups_total").increment(1);
        match search.search(kw).await {
            Ok(pairs) => {
                let found = pairs.len();
                let kept = filter_pairs(kw, pairs, filter);
                tracing::debug!(keyword = %kw, found, kept = kept.len(), "pair lookup");
                counter!("mapping_matches_total").increment(kept.len() as u64);
                out.extend(kept);
            }
            Err(e) => {
                tracing::warn!(error = ?e, keyword = %kw, "pair lookup failed");
                counter!("mapping_lookup_errors_total").increment(1);
            }
        }
    }
    out
}
