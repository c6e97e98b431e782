// tests/engine_process.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hotspot_mapper::config::HotspotConfig;
use hotspot_mapper::engine::{export_report, process};
use hotspot_mapper::ingest::types::{FetchOutcome, FetchResult};
use hotspot_mapper::mapping::dexscreener::parse_search;
use hotspot_mapper::mapping::{DexPair, PairSearch};
use hotspot_mapper::{Item, Source};
use std::fs;
use std::sync::Mutex;

/// Serves the captured search response for "moon coin", fails on "rug", empty otherwise.
struct FixtureSearch {
    body: String,
    asked: Mutex<Vec<String>>,
}

impl FixtureSearch {
    fn new() -> Self {
        Self {
            body: fs::read_to_string("tests/fixtures/dexscreener_search.json").unwrap(),
            asked: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PairSearch for FixtureSearch {
    async fn search(&self, keyword: &str) -> Result<Vec<DexPair>> {
        self.asked.lock().unwrap().push(keyword.to_string());
        match keyword {
            "moon coin" => parse_search(&self.body),
            "rug" => Err(anyhow!("dexscreener returned 429")),
            _ => Ok(Vec::new()),
        }
    }
}

fn items() -> Vec<Item> {
    vec![
        Item::new(Source::Trend, "moon coin").score_raw(300.0),
        Item::new(Source::CommunityPost, "Moon Coin ").score_raw(500.0),
        Item::new(Source::Trend, "rug").score_raw(200.0),
        Item::new(Source::Trend, "weather today").score_raw(10.0),
    ]
}

fn cfg() -> HotspotConfig {
    let mut cfg = HotspotConfig::default();
    cfg.filters.whitelist_any = vec!["coin".into(), "rug".into(), "weather".into()];
    cfg.mapping.dexscreener.enabled = true;
    cfg.mapping.dexscreener.chains = vec!["solana".into(), "tron".into()];
    cfg.mapping.dexscreener.min_liquidity_usd = 10_000.0;
    cfg
}

fn outcomes() -> Vec<FetchOutcome> {
    vec![
        FetchOutcome {
            provider: "google_trends",
            result: FetchResult::Fetched { items: 3 },
        },
        FetchOutcome {
            provider: "reddit",
            result: FetchResult::Failed {
                error: "missing REDDIT_CLIENT_ID".into(),
            },
        },
    ]
}

#[tokio::test]
async fn process_ranks_maps_and_reports_failures() {
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap();
    let search = FixtureSearch::new();
    let search_dyn: &dyn PairSearch = &search;
    let report = process(&cfg(), items(), outcomes(), Some(search_dyn), now).await;

    assert_eq!(report.scored.len(), 4);
    assert_eq!(report.hotspots[0].keyword, "moon coin");
    assert_eq!(report.hotspots[0].hits, 2);
    assert_eq!(report.hotspots[0].sources, "community_post,trend");
    assert_eq!(report.failed_sources(), vec!["reddit"]);

    // Every bucket is looked up once, in rank order; the failing one is skipped.
    assert_eq!(
        *search.asked.lock().unwrap(),
        vec!["moon coin", "rug", "weather today"]
    );
    let chains: Vec<_> = report.mappings.iter().map(|m| m.chain.as_deref()).collect();
    assert_eq!(chains, vec![Some("solana"), Some("tron")]);
    assert!(report.mappings.iter().all(|m| m.keyword == "moon coin"));
    assert_eq!(report.mappings[0].liquidity_usd, 83_211.4);
    assert_eq!(report.mappings[0].created_at, Some(1_757_100_000_000));
}

#[tokio::test]
async fn mapping_disabled_or_missing_search_yields_no_matches() {
    let now = Utc::now();
    let search = FixtureSearch::new();

    let mut off = cfg();
    off.mapping.dexscreener.enabled = false;
    let r = process(&off, items(), vec![], Some(&search as &dyn PairSearch), now).await;
    assert!(r.mappings.is_empty());
    assert!(search.asked.lock().unwrap().is_empty());

    let r = process(&cfg(), items(), vec![], None, now).await;
    assert!(r.mappings.is_empty());
    assert_eq!(r.hotspots.len(), 3);
}

#[tokio::test]
async fn max_keywords_caps_lookups() {
    let search = FixtureSearch::new();
    let mut c = cfg();
    c.mapping.dexscreener.max_keywords = 1;
    let r = process(&c, items(), vec![], Some(&search as &dyn PairSearch), Utc::now()).await;
    assert_eq!(*search.asked.lock().unwrap(), vec!["moon coin"]);
    assert_eq!(r.mappings.len(), 2);
}

#[tokio::test]
async fn export_writes_all_artifacts() {
    let now = Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap();
    let search = FixtureSearch::new();
    let report = process(&cfg(), items(), outcomes(), Some(&search as &dyn PairSearch), now).await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let paths = export_report(&report, &out).unwrap();

    let items_csv = fs::read_to_string(&paths.items_csv).unwrap();
    assert!(items_csv.starts_with("source,title,url,score_raw,timestamp,meta,score\n"));
    assert_eq!(items_csv.lines().count(), 5);

    let hotspots_csv = fs::read_to_string(&paths.hotspots_csv).unwrap();
    let mut lines = hotspots_csv.lines();
    assert_eq!(lines.next(), Some("keyword,hits,sources,score_sum"));
    assert_eq!(lines.next(), Some("moon coin,2,\"community_post,trend\",4.0"));

    let mappings_csv = fs::read_to_string(&paths.mappings_csv).unwrap();
    assert!(mappings_csv.starts_with("keyword,chain,dex_id,pair_address,"));
    assert!(mappings_csv.contains("moon coin,solana,raydium,"));

    let md = fs::read_to_string(&paths.report_md).unwrap();
    assert!(md.starts_with("# Daily Hotspot → Crypto Mapping Report"));
    assert!(md.contains("- **moon coin** | score=4.000, hits=2, sources=community_post,trend"));
    assert!(md.contains("- `moon coin` → MOON (solana) | liq=$83211.4 | https://dexscreener.com/solana/"));
}
