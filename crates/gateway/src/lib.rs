//! HTTP API gateway for PocketLLM.
//!
//! Exposes the three endpoints the mobile client talks to:
//! `GET /health`, `POST /chat` and `GET /suggestions`.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, post},
};
use pocketllm_assistant::ChatService;
use pocketllm_config::GatewayConfig;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub service: Arc<ChatService>,
}

impl GatewayState {
    pub fn new(service: Arc<ChatService>) -> SharedState {
        Arc::new(Self { service })
    }
}

pub type SharedState = Arc<GatewayState>;

/// Request bodies above this size are rejected before reaching a handler.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/health", get(api::health_handler))
        .route("/chat", post(api::chat_handler))
        .route("/suggestions", get(api::suggestions_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let router = if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and run until Ctrl-C.
pub async fn start(
    config: &GatewayConfig,
    service: Arc<ChatService>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr();
    let app = build_router(GatewayState::new(service), config.cors_permissive);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, cors_permissive = config.cors_permissive, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{ChatResponse, ErrorResponse, HealthResponse, SuggestionsResponse};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use pocketllm_core::error::ProviderError;
    use pocketllm_core::fallback::FallbackTopic;
    use pocketllm_core::policy::ModelUnavailablePolicy;
    use pocketllm_core::provider::{GenerationRequest, GenerationResponse, Provider};
    use pocketllm_core::suggest::{DEFAULT_SUGGESTIONS, STARTER_SUGGESTIONS};
    use pocketllm_providers::ModelHandle;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    struct FixedProvider(&'static str);

    #[async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, ProviderError> {
            Ok(GenerationResponse {
                text: format!("{}{}", request.prompt, self.0),
                usage: None,
                model: "fixed".into(),
            })
        }
    }

    fn app_with(handle: Arc<ModelHandle>, policy: ModelUnavailablePolicy) -> Router {
        let service = Arc::new(ChatService::new(handle).with_policy(policy));
        build_router(GatewayState::new(service), true)
    }

    fn degraded_app() -> Router {
        app_with(Arc::new(ModelHandle::empty()), ModelUnavailablePolicy::Fallback)
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_model_state() {
        let handle = Arc::new(ModelHandle::empty());
        let app = app_with(handle.clone(), ModelUnavailablePolicy::Fallback);

        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = json_body(response).await;
        assert_eq!(health.status, "healthy");
        assert!(!health.model_loaded);

        handle.install("fixed", Arc::new(FixedProvider(" ok"))).unwrap();

        let health: HealthResponse = json_body(app.oneshot(get("/health")).await.unwrap()).await;
        assert!(health.model_loaded);
        assert_eq!(health.message, "AI Assistant Backend is running!");
    }

    #[tokio::test]
    async fn chat_hello_in_degraded_mode() {
        let response = degraded_app().oneshot(post_chat(r#"{"message":"hello"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let raw: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(raw["timestamp"].is_null());

        let chat: ChatResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(chat.response, FallbackTopic::Greeting.reply());
        assert_eq!(chat.suggestions, DEFAULT_SUGGESTIONS.to_vec());
    }

    #[tokio::test]
    async fn chat_without_message_is_bad_request() {
        let response = degraded_app().oneshot(post_chat("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = json_body(response).await;
        assert_eq!(err.error, "Message is required");
    }

    #[tokio::test]
    async fn chat_with_blank_or_invalid_body_is_bad_request() {
        for body in [r#"{"message":"   "}"#, "not json", r#"{"message":42}"#] {
            let response = degraded_app().oneshot(post_chat(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
    }

    #[tokio::test]
    async fn chat_uses_model_when_loaded() {
        let handle = Arc::new(ModelHandle::empty());
        handle
            .install("fixed", Arc::new(FixedProvider(" Focus on one task at a time.")))
            .unwrap();
        let app = app_with(handle, ModelUnavailablePolicy::Error);

        let response = app
            .oneshot(post_chat(r#"{"message":"how do I focus","history":["hi","there"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat: ChatResponse = json_body(response).await;
        assert_eq!(chat.response, "Focus on one task at a time.");
        assert_eq!(
            chat.suggestions,
            vec!["Start Pomodoro timer", "Take a break", "Meditation session"]
        );
    }

    #[tokio::test]
    async fn strict_mode_surfaces_unavailable_model() {
        let app = app_with(Arc::new(ModelHandle::empty()), ModelUnavailablePolicy::Error);
        let response = app.oneshot(post_chat(r#"{"message":"hello"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let err: ErrorResponse = json_body(response).await;
        assert!(err.error.contains("restart"));
    }

    #[tokio::test]
    async fn suggestions_endpoint_returns_starters() {
        let response = degraded_app().oneshot(get("/suggestions")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: SuggestionsResponse = json_body(response).await;
        assert_eq!(body.suggestions, STARTER_SUGGESTIONS.to_vec());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = degraded_app().oneshot(get("/v1/chat")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
