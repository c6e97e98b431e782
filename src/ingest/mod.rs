// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{FetchOutcome, FetchResult, Item, SourceProvider};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Upstream request timeout; every fetch is a single attempt.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

pub const TITLE_MAX_CHARS: usize = 200;

/// One-time metrics registration (so series show up in the exporter).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Items returned by providers.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
        describe_counter!("mapping_lookups_total", "DexScreener keyword lookups.");
        describe_counter!(
            "mapping_lookup_errors_total",
            "DexScreener lookups that failed."
        );
        describe_counter!(
            "mapping_matches_total",
            "Pairs kept after chain/liquidity filters."
        );
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the hotspot pipeline last ran."
        );
    });
}

/// Build the shared HTTP client used by providers and the mapper.
/// Keeps cookies so the Google Trends session survives across calls.
pub fn http_client(user_agent: &str) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(HTTP_TIMEOUT)
        .cookie_store(true)
        .build()
        .context("building http client")
}

/// Normalize a headline: decode entities, strip tags, collapse whitespace, cap length.
pub fn normalize_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > TITLE_MAX_CHARS {
        out = out.chars().take(TITLE_MAX_CHARS).collect();
    }
    out
}

/// Current instant as an RFC 3339 string with a `Z` suffix.
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Run every provider once, in order. A failing provider does not stop the pass;
/// its failure is reported in the returned outcomes.
pub async fn run_once(providers: &[Box<dyn SourceProvider>]) -> (Vec<Item>, Vec<FetchOutcome>) {
    ensure_metrics_described();

    let mut all = Vec::new();
    let mut outcomes = Vec::with_capacity(providers.len());
    for p in providers {
        let t0 = std::time::Instant::now();
        let res = p.fetch_latest().await;
        histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(mut v) => {
                tracing::info!(provider = p.name(), items = v.len(), "provider fetched");
                counter!("ingest_items_total").increment(v.len() as u64);
                outcomes.push(FetchOutcome {
                    provider: p.name(),
                    result: FetchResult::Fetched { items: v.len() },
                });
                all.append(&mut v);
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                outcomes.push(FetchOutcome {
                    provider: p.name(),
                    result: FetchResult::Failed {
                        error: format!("{e:#}"),
                    },
                });
            }
        }
    }

    gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    (all, outcomes)
}
