//! Gateway config loader (strict parsing).
//!
//! Resolution order: `POLGATE_CONFIG` path, then `polgate.yaml` in the
//! working directory, then built-in defaults. `CERBOS_HOST` overrides the
//! admin host afterwards.

pub mod schema;

use std::fs;
use std::path::Path;

use polgate_core::error::{GatewayError, Result};

pub use schema::{AdminSection, GatewayConfig, GatewaySection};

pub const CONFIG_PATH_ENV: &str = "POLGATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "polgate.yaml";
pub const HOST_OVERRIDE_ENV: &str = "CERBOS_HOST";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GatewayError::Config(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| GatewayError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load config for the binary, applying the environment override.
pub fn load() -> Result<GatewayConfig> {
    let cfg = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_from_file(&path)?,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH)?,
        Err(_) => {
            tracing::info!("no config file, using defaults");
            GatewayConfig::default()
        }
    };

    let cfg = cfg.with_host_override(std::env::var(HOST_OVERRIDE_ENV).ok());
    cfg.validate()?;
    Ok(cfg)
}
