//! Demo entry point
//!
//! Usage: `mapsession-demo [config.json]`. `MAPSESSION_API_KEY` overrides the
//! configured key.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ms_core::SessionConfig;

mod demo;

const API_KEY_ENV: &str = "MAPSESSION_API_KEY";
const DEFAULT_FILTER: &str = "info,ms_session=debug";

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        config.api_key = Some(key);
    }
    Ok(config)
}

fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref().map(Path::new))?;
    info!("Starting map session demo (default style: {})", config.default_style);

    demo::run(config)
}
