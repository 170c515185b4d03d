use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::llm::ChatClient;
use crate::llm::draft;
use crate::llm::extract::{self, EmailRequest};
use crate::sendgrid::{self, SendGridClient};
use crate::threads::MemoryThreadStore;

/// Everything the send-email handler needs, built once at startup. The
/// thread store lives here so recipients keep their thread id across
/// requests for the lifetime of the process.
pub struct ServerState {
    pub chat: ChatClient,
    pub sendgrid: SendGridClient,
    pub sender: String,
    pub threads: MemoryThreadStore,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/send-email", post(send_email))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[derive(Debug, Deserialize)]
pub struct SendEmailBody {
    #[serde(default)]
    pub input_text: Option<String>,
}

/// `POST /send-email`: extract, validate, draft, send. Missing or
/// unparseable input is rejected before any model or provider call;
/// everything downstream maps to a 500 with a structured error body.
pub async fn send_email(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<SendEmailBody>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let input = payload
        .ok()
        .and_then(|Json(body)| body.input_text)
        .unwrap_or_default();
    let input = input.trim().to_string();

    if input.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body("Input text is required")),
        );
    }

    let details = match extract::email_details(&state.chat, &input).await {
        Ok(details) => details,
        Err(err) => {
            warn!(kind = err.kind(), "email extraction failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body("Failed to extract email details")),
            );
        }
    };

    let extracted = match details.into_request() {
        Ok(request) => request,
        Err(err) => {
            warn!(kind = err.kind(), "extracted email details incomplete");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body("Incomplete email details extracted")),
            );
        }
    };

    let body = draft::draft_body(&state.chat, &extracted.recipient, &extracted.body).await;
    let request = EmailRequest { body, ..extracted };

    let outcome =
        sendgrid::send_email(&state.sendgrid, &state.threads, &state.sender, &request).await;

    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    match serde_json::to_value(&outcome) {
        Ok(value) => (status, Json(value)),
        Err(err) => {
            warn!(error = %err, "outcome serialization failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_body("Internal server error")),
            )
        }
    }
}

fn error_body(message: &str) -> Value {
    json!({"status": "error", "message": message})
}
