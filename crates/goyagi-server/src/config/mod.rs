//! Application config loader (strict parsing).
//!
//! The file named by `GOYAGI_CONFIG` (default `goyagi.yaml`) is parsed with
//! unknown fields rejected. Without a file the development defaults apply.
//! `ENVIRONMENT` overrides the configured environment.

pub mod schema;

use std::fs;
use std::path::Path;

use goyagi_core::error::{GoyagiError, Result};

pub use schema::{
    AppConfig, DatabaseSection, Environment, ServerSection, StatsdSection, MEMORY_DATABASE_URL,
};

pub const CONFIG_PATH_ENV: &str = "GOYAGI_CONFIG";
pub const ENVIRONMENT_ENV: &str = "ENVIRONMENT";
pub const DEFAULT_CONFIG_PATH: &str = "goyagi.yaml";

pub fn load() -> Result<AppConfig> {
    let cfg = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_from_file(&path)?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH)?,
        Err(_) => AppConfig::default(),
    };
    apply_environment(cfg, std::env::var(ENVIRONMENT_ENV).ok().as_deref())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GoyagiError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig =
        serde_yaml::from_str(s).map_err(|e| GoyagiError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Apply an `ENVIRONMENT` override; empty means "keep the configured one".
pub fn apply_environment(mut cfg: AppConfig, env: Option<&str>) -> Result<AppConfig> {
    if let Some(e) = env.filter(|e| !e.is_empty()) {
        cfg.environment = e.parse()?;
    }
    cfg.validate()?;
    Ok(cfg)
}
