use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, AppResult};

use super::client::ChatClient;
use super::prompts;

pub const DEFAULT_SUBJECT: &str = "Automated Email";

/// Raw extractor output for the email flow. Every field is optional: the
/// model is free to return null, and validation happens in
/// [`EmailDetails::into_request`], never here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailDetails {
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Validated email request: the only form the action executor accepts.
#[derive(Debug, Clone, Serialize)]
pub struct EmailRequest {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl EmailDetails {
    pub fn into_request(self) -> AppResult<EmailRequest> {
        let recipient = non_empty(self.recipient).ok_or_else(incomplete_email)?;
        if !recipient.contains('@') {
            return Err(AppError::Incomplete(format!(
                "extracted recipient `{recipient}` is not an email address"
            )));
        }

        let body = non_empty(self.body).ok_or_else(incomplete_email)?;
        let subject = non_empty(self.subject).unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

        Ok(EmailRequest {
            recipient,
            subject,
            body,
        })
    }
}

fn incomplete_email() -> AppError {
    AppError::Incomplete("Incomplete email details extracted".to_string())
}

/// Raw extractor output for the meeting flow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeetingDetails {
    pub title: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub attendees: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MeetingRequest {
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub attendees: Vec<String>,
}

impl MeetingDetails {
    /// Names of the fields still missing. The meet command prompts for
    /// exactly these instead of attempting the action with partial data.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if blank(&self.title) {
            missing.push("title");
        }
        if blank(&self.date) {
            missing.push("date");
        }
        if blank(&self.start_time) {
            missing.push("start_time");
        }
        if blank(&self.end_time) {
            missing.push("end_time");
        }
        if self.attendee_list().is_empty() {
            missing.push("attendees");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn into_request(self) -> AppResult<MeetingRequest> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Incomplete(format!(
                "missing meeting details: {}",
                missing.join(", ")
            )));
        }

        let attendees = self.attendee_list();
        Ok(MeetingRequest {
            title: self.title.unwrap_or_default().trim().to_string(),
            date: self.date.unwrap_or_default().trim().to_string(),
            start_time: self.start_time.unwrap_or_default().trim().to_string(),
            end_time: self.end_time.unwrap_or_default().trim().to_string(),
            attendees,
        })
    }

    fn attendee_list(&self) -> Vec<String> {
        self.attendees
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .collect()
    }
}

fn blank(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .is_none()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// One extraction call for the email flow.
pub async fn email_details(chat: &ChatClient, input: &str) -> AppResult<EmailDetails> {
    let content = chat.chat(prompts::EMAIL_EXTRACT, input).await?;
    parse_json_payload(&content)
}

/// One extraction call for the meeting flow.
pub async fn meeting_details(chat: &ChatClient, input: &str) -> AppResult<MeetingDetails> {
    let content = chat.chat(prompts::MEETING_EXTRACT, input).await?;
    parse_json_payload(&content)
}

/// Coerce the model's reply into the target record. Models wrap JSON in
/// Markdown fences often enough that stripping them is table stakes; past
/// that, the payload either parses or the whole extraction fails.
pub fn parse_json_payload<T: DeserializeOwned>(content: &str) -> AppResult<T> {
    let cleaned = strip_code_fences(content.trim());
    serde_json::from_str(cleaned).map_err(|err| {
        AppError::Parse(format!(
            "model response is not valid JSON ({err}): {}",
            snippet(cleaned)
        ))
    })
}

fn strip_code_fences(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };

    // Skip an optional language tag on the opening fence line.
    let rest = match rest.find('\n') {
        Some(index) => &rest[index + 1..],
        None => rest,
    };

    rest.strip_suffix("```").map_or(rest, str::trim).trim()
}

fn snippet(content: &str) -> String {
    let mut end = content.len().min(120);
    while !content.is_char_boundary(end) {
        end -= 1;
    }

    if end < content.len() {
        format!("{}...", &content[..end])
    } else {
        content.to_string()
    }
}
