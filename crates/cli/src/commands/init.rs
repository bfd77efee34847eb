//! `pocketllm init` — Write a default configuration file.

use pocketllm_config::AppConfig;
use std::path::PathBuf;

pub async fn run(config_path: Option<PathBuf>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.unwrap_or_else(AppConfig::config_path);

    if path.exists() && !force {
        println!("  Config already exists: {}", path.display());
        println!("  Use --force to overwrite it.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    std::fs::write(&path, AppConfig::default_toml())?;
    println!("✅ Wrote {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Pick models under [model] (presets: smollm:135m, qwen:0.5b, tinyllama)");
    println!("  2. Build with `--features local` to enable on-device inference");
    println!("  3. Run `pocketllm serve`");

    Ok(())
}
