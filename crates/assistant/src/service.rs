//! The request-handler core: prompt → model → sanitize → suggest.

use pocketllm_config::AppConfig;
use pocketllm_core::chat::{ChatReply, ReplySource};
use pocketllm_core::error::ReplyFailure;
use pocketllm_core::fallback::fallback_reply;
use pocketllm_core::policy::ModelUnavailablePolicy;
use pocketllm_core::prompt::build_prompt;
use pocketllm_core::provider::{GenerationRequest, SamplingConfig};
use pocketllm_core::sanitize::sanitize;
use pocketllm_core::suggest::suggest;
use pocketllm_providers::ModelHandle;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Characters of user text kept in log lines.
const LOG_PREVIEW_CHARS: usize = 100;

/// Produces chat replies from the shared model handle.
pub struct ChatService {
    /// The single model slot, shared with the gateway's health check
    model: Arc<ModelHandle>,

    /// What to do when the model path fails
    policy: ModelUnavailablePolicy,

    /// Sampling parameters sent with every generation
    sampling: SamplingConfig,
}

impl ChatService {
    /// Create a service in degraded-fallback mode.
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self {
            model,
            policy: ModelUnavailablePolicy::default(),
            sampling: SamplingConfig::default(),
        }
    }

    /// Build a service using the policy from configuration.
    pub fn from_config(model: Arc<ModelHandle>, config: &AppConfig) -> Self {
        Self::new(model).with_policy(config.on_model_unavailable)
    }

    pub fn with_policy(mut self, policy: ModelUnavailablePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    pub fn policy(&self) -> ModelUnavailablePolicy {
        self.policy
    }

    /// Run the model path only: build the prompt, generate, sanitize.
    pub async fn generate_reply(
        &self,
        user_message: &str,
        history: &[String],
    ) -> Result<String, ReplyFailure> {
        let prompt = build_prompt(user_message, history);
        let request = GenerationRequest {
            prompt: prompt.clone(),
            sampling: self.sampling,
        };

        let response = self.model.generate(request).await?;
        if let Some(usage) = response.usage {
            debug!(
                model = %response.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model responded"
            );
        }

        sanitize(&response.text, &prompt)
    }

    /// Produce a full reply, applying the configured failure policy.
    pub async fn respond(
        &self,
        user_message: &str,
        history: &[String],
    ) -> Result<ChatReply, ReplyFailure> {
        let (reply_text, source) = match self.generate_reply(user_message, history).await {
            Ok(text) => (text, ReplySource::Model),
            Err(failure) => {
                warn!(
                    kind = failure.kind(),
                    error = %failure,
                    message = %preview(user_message),
                    policy = %self.policy,
                    "Model path failed"
                );
                match self.policy {
                    ModelUnavailablePolicy::Fallback => {
                        (fallback_reply(user_message).to_string(), ReplySource::Fallback)
                    }
                    ModelUnavailablePolicy::Error => return Err(failure),
                }
            }
        };

        let suggestions = suggest(user_message, &reply_text);

        info!(
            source = ?source,
            reply = %preview(&reply_text),
            suggestions = suggestions.len(),
            "Reply ready"
        );

        Ok(ChatReply {
            reply_text,
            suggestions,
            source,
        })
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    if text.chars().count() > LOG_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pocketllm_core::error::ProviderError;
    use pocketllm_core::fallback::FallbackTopic;
    use pocketllm_core::provider::{GenerationResponse, Provider};
    use pocketllm_core::suggest::DEFAULT_SUGGESTIONS;
    use std::sync::Mutex;

    /// Echoes the prompt followed by a scripted continuation.
    struct ScriptedProvider {
        continuation: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(continuation: &str) -> Arc<Self> {
            Arc::new(Self {
                continuation: continuation.into(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            assert_eq!(request.sampling, SamplingConfig::default());
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(GenerationResponse {
                text: format!("{}{}", request.prompt, self.continuation),
                usage: None,
                model: "scripted".into(),
            })
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl Provider for BrokenProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn complete(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            Err(ProviderError::Generation("index out of bounds".into()))
        }
    }

    fn service_with(provider: Arc<dyn Provider>) -> ChatService {
        let handle = Arc::new(ModelHandle::empty());
        handle.install("test", provider).unwrap();
        ChatService::new(handle)
    }

    #[tokio::test]
    async fn model_reply_is_sanitized() {
        let provider = ScriptedProvider::new(" Rust is a systems language. It is");
        let service = service_with(provider.clone());

        let reply = service.respond("What is Rust?", &[]).await.unwrap();
        assert_eq!(reply.reply_text, "Rust is a systems language.");
        assert_eq!(reply.source, ReplySource::Model);
        assert_eq!(reply.suggestions, DEFAULT_SUGGESTIONS.to_vec());
    }

    #[tokio::test]
    async fn history_reaches_the_prompt() {
        let provider = ScriptedProvider::new(" Sure thing, let us plan your week");
        let service = service_with(provider.clone());
        let history = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        service.respond("plan my work", &history).await.unwrap();
        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.as_slice(), ["Q: two three plan my work\nA:"]);
    }

    #[tokio::test]
    async fn empty_handle_falls_back_in_degraded_mode() {
        let service = ChatService::new(Arc::new(ModelHandle::empty()));
        let reply = service.respond("hello", &[]).await.unwrap();
        assert_eq!(reply.reply_text, FallbackTopic::Greeting.reply());
        assert!(reply.is_fallback());
        assert_eq!(reply.suggestions, DEFAULT_SUGGESTIONS.to_vec());
    }

    #[tokio::test]
    async fn empty_handle_errors_in_strict_mode() {
        let service = ChatService::new(Arc::new(ModelHandle::empty()))
            .with_policy(ModelUnavailablePolicy::Error);
        let err = service.respond("hello", &[]).await.unwrap_err();
        assert!(matches!(err, ReplyFailure::ModelUnavailable));
    }

    #[tokio::test]
    async fn generation_failure_follows_policy() {
        let service = service_with(Arc::new(BrokenProvider));
        let reply = service.respond("thanks!", &[]).await.unwrap();
        assert_eq!(reply.reply_text, FallbackTopic::Thanks.reply());

        let strict = service_with(Arc::new(BrokenProvider)).with_policy(ModelUnavailablePolicy::Error);
        let err = strict.respond("thanks!", &[]).await.unwrap_err();
        assert!(matches!(err, ReplyFailure::Generation(_)));
    }

    #[tokio::test]
    async fn empty_generation_follows_policy() {
        let service = service_with(ScriptedProvider::new("   "));
        let reply = service.respond("my todo list", &[]).await.unwrap();
        assert_eq!(reply.reply_text, FallbackTopic::Productivity.reply());
        assert_eq!(reply.suggestions[0], "Add a new task");

        let strict = service_with(ScriptedProvider::new("")).with_policy(ModelUnavailablePolicy::Error);
        let err = strict.respond("my todo list", &[]).await.unwrap_err();
        assert!(matches!(err, ReplyFailure::EmptyResponse));
    }

    #[test]
    fn preview_truncates_long_text() {
        let long = "a".repeat(150);
        assert_eq!(preview(&long).chars().count(), LOG_PREVIEW_CHARS + 3);
        assert_eq!(preview("short"), "short");
    }
}
