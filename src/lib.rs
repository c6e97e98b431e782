// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod config;
pub mod engine;
pub mod export;
pub mod ingest;
pub mod mapping;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{aggregate, score, score_now, HotspotBucket, WeightConfig};
pub use crate::ingest::types::{Item, ScoredItem, Source};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
/// `RUST_LOG` overrides the default filter; `HOTSPOT_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hotspot_mapper=info,warn"));

    let json = std::env::var("HOTSPOT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialized: {e}");
    }
}
