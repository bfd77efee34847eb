//! Subcommand implementations and the shared composition root.

pub mod ask;
pub mod config_cmd;
pub mod init;
pub mod serve;

use pocketllm_assistant::ChatService;
use pocketllm_config::AppConfig;
use pocketllm_providers::{ModelHandle, acquire, default_loader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Load config from `path` (or the default location) with env overrides.
pub fn load_config(path: Option<PathBuf>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = path.unwrap_or_else(AppConfig::config_path);
    AppConfig::load_with_env(&path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// Build the model handle, try to fill it, and wrap it in a chat service.
///
/// Blocks until every candidate model has been tried.
pub async fn build_service(config: &AppConfig) -> Arc<ChatService> {
    let timeout = config.model.generation_timeout_secs.map(Duration::from_secs);
    let handle = Arc::new(ModelHandle::empty().with_timeout(timeout));

    acquire(
        &handle,
        &config.model.candidates(),
        default_loader(config.model.seed),
    )
    .await;

    Arc::new(ChatService::from_config(handle, config))
}
