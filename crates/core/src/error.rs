//! Error types for the PocketLLM domain.
//!
//! Uses `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Failures raised while loading a model or running generation.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Tokenization failed: {0}")]
    Tokenization(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Model already installed: {0}")]
    AlreadyLoaded(String),
}

/// Why the model path could not produce a reply.
///
/// Every variant is handled the same way by the request handler: either the
/// fallback responder answers, or the caller gets a generic error, depending
/// on [`crate::policy::ModelUnavailablePolicy`].
#[derive(Debug, Clone, Error)]
pub enum ReplyFailure {
    /// Neither the primary nor the fallback model could be loaded.
    #[error("No language model is loaded")]
    ModelUnavailable,

    /// Tokenization or generation raised an error.
    #[error("Generation failed: {0}")]
    Generation(#[from] ProviderError),

    /// The sanitizer was left with nothing after trimming.
    #[error("Model produced an empty reply")]
    EmptyResponse,
}

impl ReplyFailure {
    /// Short machine-readable label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => "model_unavailable",
            Self::Generation(_) => "generation_failure",
            Self::EmptyResponse => "empty_response",
        }
    }

    /// The only text a client may see for this failure.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::ModelUnavailable => {
                "AI model is not available. Please restart the backend and try again."
            }
            Self::Generation(_) | Self::EmptyResponse => "Failed to generate a response",
        }
    }
}
