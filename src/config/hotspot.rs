// src/config/hotspot.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::WeightConfig;

pub const ENV_CONFIG_PATH: &str = "HOTSPOT_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/hotspot.toml";
pub const DEFAULT_JSON_PATH: &str = "config/hotspot.json";

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}
fn default_top_n() -> usize {
    30
}
fn default_lookback_hours() -> u32 {
    24
}
fn default_pumpfun_limit() -> u32 {
    120
}
fn default_max_results() -> u32 {
    200
}
fn default_max_keywords() -> usize {
    50
}
fn default_scraper() -> String {
    "snscrape".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotspotConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub mapping: MappingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            top_n: default_top_n(),
            lookback_hours: default_lookback_hours(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub google_trends: GoogleTrendsConfig,
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub pumpfun: PumpFunConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleTrendsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub kw_seed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub min_upvotes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub kw_any: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Scraper executable; resolved via PATH.
    #[serde(default = "default_scraper")]
    pub scraper: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kw_any: Vec::new(),
            max_results: default_max_results(),
            scraper: default_scraper(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PumpFunConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_pumpfun_limit")]
    pub limit: u32,
    #[serde(default)]
    pub kw_any: Vec<String>,
}

impl Default for PumpFunConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: default_pumpfun_limit(),
            kw_any: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: WeightConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub whitelist_any: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingConfig {
    #[serde(default)]
    pub dexscreener: DexScreenerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexScreenerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_liquidity_usd: f64,
    /// Allowed chain ids; empty means any chain.
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_liquidity_usd: 0.0,
            chains: Vec::new(),
            max_keywords: default_max_keywords(),
        }
    }
}

impl HotspotConfig {
    /// Trim and de-duplicate list settings, repair invalid numbers.
    fn sanitize(mut self) -> Self {
        let s = &mut self.sources;
        s.google_trends.regions = clean_list(std::mem::take(&mut s.google_trends.regions));
        s.google_trends.kw_seed = clean_list(std::mem::take(&mut s.google_trends.kw_seed));
        s.reddit.subreddits = clean_list(std::mem::take(&mut s.reddit.subreddits));
        s.twitter.kw_any = clean_list(std::mem::take(&mut s.twitter.kw_any));
        s.pumpfun.kw_any = clean_list(std::mem::take(&mut s.pumpfun.kw_any));
        self.filters.whitelist_any = clean_list(std::mem::take(&mut self.filters.whitelist_any));
        self.mapping.dexscreener.chains =
            clean_list(std::mem::take(&mut self.mapping.dexscreener.chains));

        self.scoring.weights.sanitize();
        if !self.mapping.dexscreener.min_liquidity_usd.is_finite() {
            self.mapping.dexscreener.min_liquidity_usd = 0.0;
        }
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<HotspotConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $HOTSPOT_CONFIG_PATH
/// 2) config/hotspot.toml
/// 3) config/hotspot.json
/// 4) built-in defaults (every source disabled)
pub fn load_config_default() -> Result<HotspotConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    for p in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
    }
    tracing::warn!("no config file found, using defaults");
    Ok(HotspotConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<HotspotConfig> {
    let cfg = match hint_ext {
        "json" => serde_json::from_str::<HotspotConfig>(s)?,
        "toml" => toml::from_str::<HotspotConfig>(s)?,
        _ => match toml::from_str::<HotspotConfig>(s) {
            Ok(c) => c,
            Err(_) => serde_json::from_str::<HotspotConfig>(s)
                .map_err(|_| anyhow!("unsupported config format"))?,
        },
    };
    Ok(cfg.sanitize())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|x| x == t) {
            out.push(t.to_string());
        }
    }
    out
}
