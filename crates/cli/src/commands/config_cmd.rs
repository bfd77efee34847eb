//! `pocketllm config` — Show and validate the effective configuration.

use pocketllm_config::AppConfig;
use std::path::PathBuf;

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.clone().unwrap_or_else(AppConfig::config_path);
    println!("🔍 Configuration ({})", path.display());

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed and validated");
            config
        }
        Err(e) => {
            println!("   ❌ {e}");
            return Err(e);
        }
    };

    let mut warnings = Vec::new();
    if config.model.fallback.is_none() {
        warnings.push("No fallback model; a failed primary load means degraded mode");
    }
    if config.model.generation_timeout_secs.is_none() {
        warnings.push("No generation timeout; a hung generation blocks its request");
    }
    if cfg!(not(feature = "local")) {
        warnings.push("Built without the `local` feature; every reply will be a fallback");
    }
    for w in &warnings {
        println!("   ⚠️  {w}");
    }

    println!();
    println!("{}", config.to_toml());

    Ok(())
}
