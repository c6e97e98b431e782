//! hotspot-mapper: run one pass and write reports.
//!
//! Config is read from `$HOTSPOT_CONFIG_PATH` or `config/hotspot.toml`;
//! secrets (Reddit credentials) come from the environment or `.env`.

use anyhow::Context;
use hotspot_mapper::{config, engine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    hotspot_mapper::init_tracing();

    let cfg = config::load_config_default().context("loading hotspot config")?;
    let report = engine::run(&cfg).await?;
    let paths = engine::export_report(&report, &cfg.run.out_dir)?;

    tracing::info!(
        report = %paths.report_md.display(),
        failed_sources = report.failed_sources().len(),
        "wrote outputs"
    );
    println!("Done. Wrote to {}/", cfg.run.out_dir.display());
    Ok(())
}
