// tests/config_load.rs
use hotspot_mapper::config::{load_config_default, load_config_from};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const ENV: &str = "HOTSPOT_CONFIG_PATH";

/// Restores the working directory when dropped.
struct CwdGuard(PathBuf);

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let prev = env::current_dir().unwrap();
        env::set_current_dir(dir).unwrap();
        Self(prev)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = env::set_current_dir(&self.0);
    }
}

#[test]
#[serial]
fn sample_config_parses() {
    let c = load_config_from(Path::new("config/hotspot.toml")).unwrap();
    assert!(c.sources.google_trends.enabled);
    assert_eq!(c.sources.google_trends.regions, vec!["US", "GB"]);
    assert!(!c.sources.twitter.enabled);
    assert_eq!(c.scoring.weights.recency_hours_half_life, 24.0);
    assert_eq!(c.mapping.dexscreener.min_liquidity_usd, 10_000.0);
    assert_eq!(c.mapping.dexscreener.chains.len(), 4);
}

#[test]
#[serial]
fn env_path_wins() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("custom.json");
    fs::write(&p, r#"{"run":{"top_n":7},"sources":{"reddit":{"enabled":true}}}"#).unwrap();

    env::set_var(ENV, &p);
    let c = load_config_default();
    env::remove_var(ENV);

    let c = c.unwrap();
    assert_eq!(c.run.top_n, 7);
    assert!(c.sources.reddit.enabled);
}

#[test]
#[serial]
fn env_path_missing_is_an_error() {
    env::set_var(ENV, "/definitely/not/here/hotspot.toml");
    let res = load_config_default();
    env::remove_var(ENV);
    assert!(res.is_err());
}

#[test]
#[serial]
fn falls_back_to_json_then_defaults() {
    env::remove_var(ENV);
    let dir = tempfile::tempdir().unwrap();
    let _cwd = CwdGuard::enter(dir.path());

    let c = load_config_default().unwrap();
    assert_eq!(c.run.top_n, 30);
    assert!(!c.sources.pumpfun.enabled);

    fs::create_dir_all("config").unwrap();
    fs::write("config/hotspot.json", r#"{"filters":{"whitelist_any":["pepe"]}}"#).unwrap();
    let c = load_config_default().unwrap();
    assert_eq!(c.filters.whitelist_any, vec!["pepe"]);

    fs::write("config/hotspot.toml", "[run]\nlookback_hours = 6\n").unwrap();
    let c = load_config_default().unwrap();
    assert_eq!(c.run.lookback_hours, 6);
    assert!(c.filters.whitelist_any.is_empty());
}

#[test]
#[serial]
fn malformed_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("broken.toml");
    fs::write(&p, "[run\ntop_n = ").unwrap();
    let err = load_config_from(&p).unwrap_err();
    assert!(format!("{err:#}").contains("broken.toml"));
}
