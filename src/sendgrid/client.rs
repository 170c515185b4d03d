use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

use super::mail::MailPayload;

const SENDGRID_API_BASE_URL: &str = "https://api.sendgrid.com";
const MAIL_SEND_ENDPOINT: &str = "/v3/mail/send";

#[derive(Debug, Clone)]
pub struct SendGridClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SendGridClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(SENDGRID_API_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Submit one message. Returns the provider's response code (202 on
    /// acceptance).
    pub async fn send(&self, payload: &MailPayload) -> AppResult<u16> {
        let url = format!(
            "{}{MAIL_SEND_ENDPOINT}",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_send_error(status, &body))
    }
}

fn map_send_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_error_messages(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "sendgrid authorization failed ({status}): {message}. check SENDGRID_API_KEY"
        ));
    }

    AppError::Api(format!("sendgrid request failed ({status}): {message}"))
}

#[derive(Debug, Deserialize)]
struct SendGridErrorEnvelope {
    errors: Option<Vec<SendGridError>>,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    message: Option<String>,
    field: Option<String>,
}

fn parse_error_messages(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<SendGridErrorEnvelope>(body).ok()?;
    let errors = envelope.errors?;

    let mut parts = Vec::new();
    for error in errors {
        let Some(message) = error.message else {
            continue;
        };

        match error.field {
            Some(field) => parts.push(format!("{message} (field={field})")),
            None => parts.push(message),
        }
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.join("; "))
}
