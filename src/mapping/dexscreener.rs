// src/mapping/dexscreener.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::PairSearch;

pub const SEARCH_URL: &str = "https://api.dexscreener.com/latest/dex/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    pairs: Option<Vec<DexPair>>,
}

/// Subset of a DexScreener pair record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default, alias = "chain")]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub dex_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub pair_address: Option<String>,
    #[serde(default)]
    pub base_token: Option<Token>,
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(default)]
    pub fdv: Option<f64>,
    #[serde(default)]
    pub pair_created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Liquidity {
    #[serde(default)]
    pub usd: Option<f64>,
}

impl DexPair {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity
            .as_ref()
            .and_then(|l| l.usd)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

/// Parse a `/latest/dex/search` body; `"pairs": null` is an empty result.
pub fn parse_search(body: &str) -> Result<Vec<DexPair>> {
    let r: SearchResponse = serde_json::from_str(body).context("parsing dexscreener json")?;
    Ok(r.pairs.unwrap_or_default())
}

pub struct DexScreenerClient {
    client: reqwest::Client,
    url: String,
}

impl DexScreenerClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: SEARCH_URL.to_string(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl PairSearch for DexScreenerClient {
    async fn search(&self, keyword: &str) -> Result<Vec<DexPair>> {
        let body = self
            .client
            .get(&self.url)
            .query(&[("q", keyword)])
            .send()
            .await
            .context("dexscreener get()")?
            .error_for_status()
            .context("dexscreener non-2xx")?
            .text()
            .await
            .context("dexscreener .text()")?;
        parse_search(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pairs_is_empty() {
        assert!(parse_search(r#"{"schemaVersion":"1.0.0","pairs":null}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn pair_fields_are_read() {
        let body = r#"{"pairs":[{"chainId":"solana","dexId":"raydium","url":"https://dexscreener.com/solana/abc",
            "pairAddress":"abc","baseToken":{"address":"m","name":"Moon","symbol":"MOON"},
            "priceUsd":"0.0012","liquidity":{"usd":15000.5},"fdv":120000,"pairCreatedAt":1700000000000}]}"#;
        let pairs = parse_search(body).unwrap();
        assert_eq!(pairs.len(), 1);
        let p = &pairs[0];
        assert_eq!(p.chain_id.as_deref(), Some("solana"));
        assert_eq!(p.liquidity_usd(), 15000.5);
        assert_eq!(p.base_token.as_ref().and_then(|t| t.symbol.as_deref()), Some("MOON"));
        assert_eq!(p.pair_created_at, Some(1_700_000_000_000));
    }
}
