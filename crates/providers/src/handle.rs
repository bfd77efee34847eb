//! The process-wide model slot.
//!
//! Filled at most once during startup, read-only afterwards. Every
//! generation goes through [`ModelHandle::generate`], which holds a gate so
//! at most one call reaches the provider at a time.

use pocketllm_core::error::{ProviderError, ReplyFailure};
use pocketllm_core::provider::{GenerationRequest, GenerationResponse, Provider};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

struct LoadedModel {
    name: String,
    provider: Arc<dyn Provider>,
}

/// Holds the single active model, if any.
pub struct ModelHandle {
    slot: OnceLock<LoadedModel>,
    gate: Mutex<()>,
    timeout: Option<Duration>,
}

impl ModelHandle {
    /// A handle with no model. Stays empty until [`install`](Self::install).
    pub fn empty() -> Self {
        Self {
            slot: OnceLock::new(),
            gate: Mutex::new(()),
            timeout: None,
        }
    }

    /// Bound each generation call; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Put a loaded model into the slot. Fails if one is already there.
    pub fn install(
        &self,
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Result<(), ProviderError> {
        let name = name.into();
        self.slot
            .set(LoadedModel { name, provider })
            .map_err(|rejected| ProviderError::AlreadyLoaded(rejected.name))
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Name of the installed model, as it was requested at startup.
    pub fn model_name(&self) -> Option<&str> {
        self.slot.get().map(|m| m.name.as_str())
    }

    /// Run one generation, serialized against all other callers.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, ReplyFailure> {
        let Some(model) = self.slot.get() else {
            return Err(ReplyFailure::ModelUnavailable);
        };

        let _guard = self.gate.lock().await;
        debug!(model = %model.name, prompt_len = request.prompt.len(), "Generation started");

        let call = model.provider.complete(request);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        model = %model.name,
                        timeout_secs = limit.as_secs(),
                        "Generation timed out"
                    );
                    Err(ProviderError::Timeout {
                        timeout_secs: limit.as_secs(),
                    })
                }
            },
            None => call.await,
        };

        result.map_err(ReplyFailure::from)
    }
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::empty()
    }
}
