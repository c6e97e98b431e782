// src/config/mod.rs
pub mod hotspot;

pub use hotspot::{load_config_default, load_config_from, HotspotConfig};
