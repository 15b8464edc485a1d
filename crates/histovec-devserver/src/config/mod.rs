//! Dev server config loading.
//!
//! YAML is parsed strictly (unknown keys are errors) and validated before use.
//! A missing path or a document with no keys yields the defaults.

pub mod schema;

use std::fs;

use histovec_core::error::{HistovecError, Result};

pub use schema::DevServerConfig;

/// Load from `path`, or fall back to validated defaults.
pub fn load(path: Option<&str>) -> Result<DevServerConfig> {
    match path {
        Some(p) => {
            let cfg = load_from_file(p)?;
            tracing::info!(path = p, "dev server config loaded");
            Ok(cfg)
        }
        None => {
            let cfg = DevServerConfig::default();
            cfg.validate()?;
            tracing::debug!("no dev server config given, using defaults");
            Ok(cfg)
        }
    }
}

pub fn load_from_file(path: &str) -> Result<DevServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| HistovecError::Internal(format!("read config {path:?} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<DevServerConfig> {
    // Comment-only files parse as an empty mapping.
    let doc = if is_blank(s) { "{}" } else { s };
    let cfg: DevServerConfig = serde_yaml::from_str(doc)
        .map_err(|e| HistovecError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

fn is_blank(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#') || l == "---")
}
