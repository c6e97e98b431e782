// src/export.rs
//! CSV and Markdown writers for one run's results.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::HotspotBucket;
use crate::ingest::types::ScoredItem;
use crate::mapping::PairMatch;

pub const REPORT_MAX_HOTSPOTS: usize = 50;
pub const REPORT_MAX_MAPPINGS: usize = 100;

const ITEM_COLUMNS: [&str; 7] = [
    "source",
    "title",
    "url",
    "score_raw",
    "timestamp",
    "meta",
    "score",
];
const HOTSPOT_COLUMNS: [&str; 4] = ["keyword", "hits", "sources", "score_sum"];
const MAPPING_COLUMNS: [&str; 11] = [
    "keyword",
    "chain",
    "dex_id",
    "pair_address",
    "base_token",
    "base_name",
    "fdv",
    "liquidity_usd",
    "price_usd",
    "url",
    "created_at",
];

#[derive(Serialize)]
struct ItemRow<'a> {
    source: &'a str,
    title: &'a str,
    url: &'a str,
    score_raw: f64,
    timestamp: &'a str,
    meta: String,
    score: f64,
}

impl<'a> From<&'a ScoredItem> for ItemRow<'a> {
    fn from(s: &'a ScoredItem) -> Self {
        Self {
            source: s.item.source.as_str(),
            title: &s.item.title,
            url: &s.item.url,
            score_raw: s.item.score_raw,
            timestamp: &s.item.timestamp,
            meta: serde_json::to_string(&s.item.meta).unwrap_or_default(),
            score: s.score,
        }
    }
}

/// Paths written by [`write_all`].
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub items_csv: PathBuf,
    pub hotspots_csv: PathBuf,
    pub mappings_csv: PathBuf,
    pub report_md: PathBuf,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

/// Header is always written, even for zero rows.
fn write_csv<T, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    ensure_parent(path)?;
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    w.write_record(header)?;
    for r in rows {
        w.serialize(r)?;
    }
    w.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

pub fn export_items_csv(path: &Path, items: &[ScoredItem]) -> Result<()> {
    write_csv(path, &ITEM_COLUMNS, items.iter().map(ItemRow::from))
}

pub fn export_hotspots_csv(path: &Path, hotspots: &[HotspotBucket]) -> Result<()> {
    write_csv(path, &HOTSPOT_COLUMNS, hotspots)
}

pub fn export_mappings_csv(path: &Path, mappings: &[PairMatch]) -> Result<()> {
    write_csv(path, &MAPPING_COLUMNS, mappings)
}

/// Markdown summary: top hotspots then DexScreener matches.
pub fn render_report_md(hotspots: &[HotspotBucket], mappings: &[PairMatch]) -> String {
    let mut s = String::new();
    s.push_str("# Daily Hotspot → Crypto Mapping Report\n\n");
    s.push_str("## Hotspots (Aggregated)\n\n");
    for h in hotspots.iter().take(REPORT_MAX_HOTSPOTS) {
        let _ = writeln!(
            s,
            "- **{}** | score={:.3}, hits={}, sources={}",
            h.keyword, h.score_sum, h.hits, h.sources
        );
    }
    s.push_str("\n## DexScreener Matches\n\n");
    for m in mappings.iter().take(REPORT_MAX_MAPPINGS) {
        let _ = writeln!(
            s,
            "- `{}` → {} ({}) | liq=${} | {}",
            m.keyword,
            m.base_token.as_deref().unwrap_or("N/A"),
            m.chain.as_deref().unwrap_or("?"),
            m.liquidity_usd,
            m.url.as_deref().unwrap_or_default()
        );
    }
    s
}

pub fn export_report_md(path: &Path, hotspots: &[HotspotBucket], mappings: &[PairMatch]) -> Result<()> {
    ensure_parent(path)?;
    fs::write(path, render_report_md(hotspots, mappings))
        .with_context(|| format!("writing {}", path.display()))
}

/// Write every artifact into `out_dir`, creating it if needed.
pub fn write_all(
    out_dir: &Path,
    items: &[ScoredItem],
    hotspots: &[HotspotBucket],
    mappings: &[PairMatch],
) -> Result<ExportPaths> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let paths = ExportPaths {
        items_csv: out_dir.join("items_scored.csv"),
        hotspots_csv: out_dir.join("hotspots.csv"),
        mappings_csv: out_dir.join("dex_mappings.csv"),
        report_md: out_dir.join("report.md"),
    };
    export_items_csv(&paths.items_csv, items)?;
    export_hotspots_csv(&paths.hotspots_csv, hotspots)?;
    export_mappings_csv(&paths.mappings_csv, mappings)?;
    export_report_md(&paths.report_md, hotspots, mappings)?;
    Ok(paths)
}
