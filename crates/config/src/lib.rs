//! Configuration loading, validation, and management for PocketLLM.
//!
//! Loads configuration from `~/.pocketllm/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use pocketllm_core::ModelUnavailablePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.pocketllm/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// What `/chat` does when the model path cannot answer
    #[serde(default)]
    pub on_model_unavailable: ModelUnavailablePolicy,

    /// Model selection and generation limits
    #[serde(default)]
    pub model: ModelConfig,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Default primary model: SmolLM 135M, small enough for a laptop CPU.
pub const DEFAULT_PRIMARY_MODEL: &str = "smollm:135m";

/// Default fallback model, tried when the primary fails to load.
pub const DEFAULT_FALLBACK_MODEL: &str = "qwen:0.5b";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Preset alias or path to a `.gguf` file
    #[serde(default = "default_primary")]
    pub primary: String,

    /// Tried when the primary fails; `None` disables the second attempt
    #[serde(default = "default_fallback", skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,

    /// Upper bound on a single generation call; unset means no timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_timeout_secs: Option<u64>,

    /// Seed for the sampler
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_primary() -> String {
    DEFAULT_PRIMARY_MODEL.into()
}
fn default_fallback() -> Option<String> {
    Some(DEFAULT_FALLBACK_MODEL.into())
}
fn default_seed() -> u64 {
    299_792_458
}

impl ModelConfig {
    /// Models to try at startup, in priority order.
    pub fn candidates(&self) -> Vec<String> {
        std::iter::once(self.primary.clone())
            .chain(self.fallback.clone())
            .collect()
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            fallback: default_fallback(),
            generation_timeout_secs: None,
            seed: default_seed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Allow any origin; the mobile client runs on another LAN host
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

fn default_port() -> u16 {
    5004
}
fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_true() -> bool {
    true
}

impl GatewayConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            cors_permissive: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.pocketllm/config.toml).
    ///
    /// Environment overrides, applied after the file:
    /// - `POCKETLLM_PRIMARY_MODEL`, `POCKETLLM_FALLBACK_MODEL`
    /// - `POCKETLLM_HOST`, `POCKETLLM_PORT`
    /// - `POCKETLLM_ON_MODEL_UNAVAILABLE` (`fallback` | `error`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally `std::env::var`).
    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("POCKETLLM_PRIMARY_MODEL") {
            self.model.primary = model;
        }

        if let Some(model) = lookup("POCKETLLM_FALLBACK_MODEL") {
            self.model.fallback = if model.trim().is_empty() {
                None
            } else {
                Some(model)
            };
        }

        if let Some(host) = lookup("POCKETLLM_HOST") {
            self.gateway.host = host;
        }

        if let Some(port) = lookup("POCKETLLM_PORT") {
            self.gateway.port = port.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!("POCKETLLM_PORT is not a valid port: {port}"))
            })?;
        }

        if let Some(policy) = lookup("POCKETLLM_ON_MODEL_UNAVAILABLE") {
            self.on_model_unavailable = policy.parse().map_err(ConfigError::ValidationError)?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".pocketllm")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.primary.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.primary must not be empty".into(),
            ));
        }

        if self.model.generation_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "model.generation_timeout_secs must be > 0 when set".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.addr(), "0.0.0.0:5004");
        assert_eq!(config.on_model_unavailable, ModelUnavailablePolicy::Fallback);
        assert_eq!(config.model.candidates(), vec!["smollm:135m", "qwen:0.5b"]);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let parsed: AppConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.model.primary, config.model.primary);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model.primary, DEFAULT_PRIMARY_MODEL);
    }

    #[test]
    fn parses_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
on_model_unavailable = "error"

[model]
primary = "/models/tiny.gguf"
generation_timeout_secs = 45

[gateway]
port = 8080
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.on_model_unavailable, ModelUnavailablePolicy::Error);
        assert_eq!(config.model.primary, "/models/tiny.gguf");
        assert_eq!(config.model.fallback.as_deref(), Some(DEFAULT_FALLBACK_MODEL));
        assert_eq!(config.model.generation_timeout_secs, Some(45));
        assert_eq!(config.gateway.addr(), "0.0.0.0:8080");
        assert!(config.gateway.cors_permissive);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "on_model_unavailable = \"sometimes\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.model.generation_timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("POCKETLLM_PRIMARY_MODEL", "tinyllama"),
                ("POCKETLLM_FALLBACK_MODEL", ""),
                ("POCKETLLM_PORT", "9000"),
                ("POCKETLLM_ON_MODEL_UNAVAILABLE", "error"),
            ]))
            .unwrap();

        assert_eq!(config.model.candidates(), vec!["tinyllama"]);
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.on_model_unavailable, ModelUnavailablePolicy::Error);
    }

    #[test]
    fn bad_env_port_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env(&[("POCKETLLM_PORT", "http")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("smollm:135m"));
        assert!(toml_str.contains("5004"));
        assert!(toml_str.contains("on_model_unavailable = \"fallback\""));
    }
}
