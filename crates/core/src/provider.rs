//! Provider trait — the abstraction over text-generation backends.
//!
//! A Provider takes a prompt string plus a sampling configuration and returns
//! the decoded text. The weights, tokenizer and sampling loop live behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// Sampling parameters for a single generation call.
///
/// The service only ever uses [`SamplingConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Upper bound on tokens generated beyond the prompt
    pub max_new_tokens: u32,

    /// Softmax temperature
    pub temperature: f64,

    /// Nucleus sampling cutoff
    pub top_p: f64,

    /// Penalty applied to logits of tokens already generated (1.0 = off)
    pub repetition_penalty: f32,

    /// Sample from the distribution; `false` means greedy decoding
    pub do_sample: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: 100,
            temperature: 0.7,
            top_p: 0.9,
            repetition_penalty: 1.1,
            do_sample: true,
        }
    }
}

/// A single text-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The full prompt text
    pub prompt: String,

    /// Sampling parameters
    #[serde(default)]
    pub sampling: SamplingConfig,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            sampling: SamplingConfig::default(),
        }
    }
}

/// The result of a generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Decoded prompt + continuation, special tokens stripped
    pub text: String,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model produced the text
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// The core Provider trait.
///
/// Implementations are not required to be reentrant; callers serialize access
/// through a model handle.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "local/smollm:135m").
    fn name(&self) -> &str;

    /// Generate a continuation for the request's prompt.
    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, ProviderError>;
}
