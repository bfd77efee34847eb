//! Startup model acquisition — ordered candidate chain.
//!
//! Tries each configured model in priority order and installs the first one
//! that loads. When every candidate fails, the handle is left empty and the
//! service runs in degraded mode. Nothing here is retried later.

use crate::handle::ModelHandle;
use pocketllm_core::error::ProviderError;
use pocketllm_core::provider::Provider;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Knows how to turn a model identifier into a ready [`Provider`].
///
/// Loading is blocking (downloads, file I/O, weight parsing) and is always
/// called from a blocking thread.
pub trait ModelLoader: Send + Sync {
    fn load(&self, model: &str) -> Result<Arc<dyn Provider>, ProviderError>;
}

/// Used when no inference runtime was compiled in.
pub struct DisabledLoader;

impl ModelLoader for DisabledLoader {
    fn load(&self, model: &str) -> Result<Arc<dyn Provider>, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "cannot load '{model}': built without the `local` feature"
        )))
    }
}

/// Try `candidates` in order and install the first model that loads.
///
/// Returns the installed model's name, or `None` in degraded mode.
pub async fn acquire(
    handle: &ModelHandle,
    candidates: &[String],
    loader: Arc<dyn ModelLoader>,
) -> Option<String> {
    for (i, candidate) in candidates.iter().enumerate() {
        info!(
            model = %candidate,
            attempt = i + 1,
            total = candidates.len(),
            "Loading model"
        );

        let name = candidate.clone();
        let loader = loader.clone();
        let loaded = tokio::task::spawn_blocking(move || loader.load(&name))
            .await
            .unwrap_or_else(|e| {
                Err(ProviderError::NotConfigured(format!(
                    "model loading task failed: {e}"
                )))
            });

        match loaded {
            Ok(provider) => match handle.install(candidate.clone(), provider) {
                Ok(()) => {
                    info!(model = %candidate, "Model loaded successfully");
                    return Some(candidate.clone());
                }
                Err(e) => {
                    warn!(model = %candidate, error = %e, "Model slot already filled");
                    return handle.model_name().map(str::to_string);
                }
            },
            Err(e) => {
                warn!(
                    model = %candidate,
                    error = %e,
                    "Model failed to load, trying next candidate"
                );
            }
        }
    }

    error!(
        tried = candidates.len(),
        "No model could be loaded; serving fallback replies only"
    );
    None
}
