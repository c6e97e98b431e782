// src/ingest/providers/mod.rs
pub mod google_trends;
pub mod pumpfun;
pub mod reddit;
pub mod twitter;
