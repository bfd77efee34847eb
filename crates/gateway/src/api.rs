//! Handlers for the mobile client API: `/health`, `/chat`, `/suggestions`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pocketllm_core::error::ReplyFailure;
use pocketllm_core::suggest::STARTER_SUGGESTIONS;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::SharedState;

const MESSAGE_REQUIRED: &str = "Message is required";

// --- Request / response bodies ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub history: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub suggestions: Vec<String>,
    /// Always null; the client stamps its own time
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// --- Errors ---

/// Everything `/chat` can answer with besides a reply.
#[derive(Debug)]
pub enum ApiError {
    /// No usable `message` in the body
    MalformedRequest,
    /// The model path failed and the policy says to surface it
    Reply(ReplyFailure),
}

impl From<ReplyFailure> for ApiError {
    fn from(failure: ReplyFailure) -> Self {
        Self::Reply(failure)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MalformedRequest => (StatusCode::BAD_REQUEST, MESSAGE_REQUIRED),
            Self::Reply(failure @ ReplyFailure::ModelUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, failure.public_message())
            }
            Self::Reply(failure) => (StatusCode::INTERNAL_SERVER_ERROR, failure.public_message()),
        };
        let body = ErrorResponse {
            error: message.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// --- Handlers ---

pub async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        model_loaded: state.service.model().is_loaded(),
        message: "AI Assistant Backend is running!".into(),
    })
}

pub async fn suggestions_handler() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        suggestions: STARTER_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    })
}

pub async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "Rejected /chat body");
            return Err(ApiError::MalformedRequest);
        }
    };

    let message = match request.message {
        Some(m) if !m.trim().is_empty() => m,
        _ => {
            warn!("Rejected /chat request without a message");
            return Err(ApiError::MalformedRequest);
        }
    };
    let history = request.history.unwrap_or_default();

    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id);

    async move {
        info!(
            message_len = message.len(),
            history_len = history.len(),
            "Received chat message"
        );

        let reply = state.service.respond(&message, &history).await?;

        Ok::<_, ApiError>(Json(ChatResponse {
            response: reply.reply_text,
            suggestions: reply.suggestions,
            timestamp: None,
        }))
    }
    .instrument(span)
    .await
}
