use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Retries performed by the client itself on transport faults and 5xx/429
/// responses. Callers never retry on top of this.
const DEFAULT_MAX_RETRIES: u32 = 2;
const RETRY_BASE_BACKOFF_MS: u64 = 200;

/// Minimal chat-completions client. One call per extraction or drafting
/// step; deterministic output is preferred, so temperature is pinned to 0.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system+user exchange and return the assistant text.
    pub async fn chat(&self, system: &str, user: &str) -> AppResult<String> {
        let url = format!(
            "{}/{CHAT_COMPLETIONS_PATH}",
            self.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
        };

        let attempts = self.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = RETRY_BASE_BACKOFF_MS << (attempt - 1).min(8);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            debug!(attempt = attempt + 1, model = %self.model, "chat completion request");

            let response = match self
                .http
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    last_error = Some(AppError::Http(err));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let payload: ChatResponse = response.json().await?;
                return extract_content(payload);
            }

            let body = response.text().await.unwrap_or_default();
            let error = map_chat_error(status, &body);

            if retryable(status) && attempt + 1 < attempts {
                last_error = Some(error);
                continue;
            }

            return Err(error);
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Api("chat client exhausted retries".to_string())))
    }
}

fn retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn extract_content(payload: ChatResponse) -> AppResult<String> {
    let choice = payload
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Api("chat completion returned no choices".to_string()))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| AppError::Api("chat completion returned no content".to_string()))?;

    Ok(content)
}

fn map_chat_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "llm api authorization failed ({status}): {message}. check LLM_API_KEY"
        ));
    }

    AppError::Api(format!("llm api request failed ({status}): {message}"))
}

fn parse_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<ChatErrorEnvelope>(body).ok()?;
    let mut parts = vec![envelope.error.message?];

    if let Some(kind) = envelope.error.kind {
        parts.push(format!("type={kind}"));
    }

    Some(parts.join(", "))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorEnvelope {
    error: ChatError,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}
