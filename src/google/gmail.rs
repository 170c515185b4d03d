use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use serde::Deserialize;

use crate::error::AppResult;

use super::http;
use super::models::{MailThread, MessageView};

const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com";

#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: String,
}

impl GmailClient {
    pub fn new() -> Self {
        Self::with_base_url(GMAIL_API_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn get_msg(&self, id: &str, access_token: &str) -> AppResult<MessageView> {
        let endpoint = format!("/gmail/v1/users/me/messages/{id}");
        let query = vec![("format".to_string(), "full".to_string())];
        let resource: GmailMessageResource = http::get_json(
            &self.http,
            &self.base_url,
            &endpoint,
            access_token,
            Some(&query),
        )
        .await?;
        Ok(resource.into_view())
    }

    /// Fetch the most recent messages for the authenticated account, newest
    /// first, up to `limit`.
    pub async fn list_recent(
        &self,
        access_token: &str,
        limit: u32,
    ) -> AppResult<Vec<MessageView>> {
        let query = vec![("maxResults".to_string(), limit.to_string())];
        let listing: GmailMessageListResource = http::get_json(
            &self.http,
            &self.base_url,
            "/gmail/v1/users/me/messages",
            access_token,
            Some(&query),
        )
        .await?;

        let mut results = Vec::new();
        for entry in listing.messages.unwrap_or_default() {
            let message = self.get_msg(&entry.id, access_token).await?;
            results.push(message);
        }

        Ok(results)
    }
}

impl Default for GmailClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Group fetched messages by provider thread id, preserving the order in
/// which threads are first encountered and arrival order within a thread.
pub fn group_threads(messages: &[MessageView]) -> Vec<MailThread> {
    let mut threads: Vec<MailThread> = Vec::new();

    for message in messages {
        let thread_id = message
            .thread_id
            .clone()
            .unwrap_or_else(|| message.id.clone());

        let index = match threads.iter().position(|thread| thread.thread_id == thread_id) {
            Some(index) => index,
            None => {
                threads.push(MailThread {
                    thread_id,
                    subject: message
                        .subject
                        .clone()
                        .unwrap_or_else(|| "No Subject".to_string()),
                    messages: Vec::new(),
                });
                threads.len() - 1
            }
        };

        threads[index].messages.push(message_entry(message));
    }

    threads
}

/// Render one message for the summarize prompt. Empty-bodied messages
/// contribute nothing so an all-empty thread stays blank and triggers the
/// no-conversation policy instead of an LLM call.
fn message_entry(message: &MessageView) -> String {
    let body = message.body.as_deref().unwrap_or_default();
    if body.trim().is_empty() {
        return String::new();
    }

    let from = message.from.as_deref().unwrap_or("Unknown Sender");
    format!("From: {from}\n{body}\n")
}

#[derive(Debug, Deserialize)]
struct GmailMessageListResource {
    messages: Option<Vec<GmailMessageListEntry>>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GmailMessageResource {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
    snippet: Option<String>,
    payload: Option<GmailMessagePayload>,
}

impl GmailMessageResource {
    fn into_view(self) -> MessageView {
        let (headers, body) = match self.payload {
            Some(payload) => {
                let body = payload.body_text();
                (payload.headers.unwrap_or_default(), body)
            }
            None => (Vec::new(), None),
        };

        let snippet = self
            .snippet
            .map(|snippet| html_escape::decode_html_entities(&snippet).to_string());

        MessageView {
            id: self.id,
            thread_id: self.thread_id,
            subject: header_value(&headers, "Subject"),
            from: header_value(&headers, "From"),
            snippet,
            body,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GmailMessagePayload {
    headers: Option<Vec<GmailMessageHeader>>,
    body: Option<GmailMessageBody>,
    parts: Option<Vec<GmailMessagePart>>,
}

impl GmailMessagePayload {
    /// Decoded body text: a `text/plain` part wins, then any part carrying
    /// data, then the top-level body.
    fn body_text(&self) -> Option<String> {
        if let Some(parts) = &self.parts {
            if let Some(data) = find_part_data(parts, true) {
                return decode_body(&data);
            }
            if let Some(data) = find_part_data(parts, false) {
                return decode_body(&data);
            }
        }

        self.body
            .as_ref()
            .and_then(|body| body.data.as_deref())
            .and_then(decode_body)
    }
}

#[derive(Debug, Deserialize)]
struct GmailMessagePart {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    body: Option<GmailMessageBody>,
    parts: Option<Vec<GmailMessagePart>>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageHeader {
    name: String,
    value: String,
}

fn find_part_data(parts: &[GmailMessagePart], plain_only: bool) -> Option<String> {
    for part in parts {
        let matches_mime = !plain_only
            || part
                .mime_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("text/plain"));

        if matches_mime {
            if let Some(data) = part.body.as_ref().and_then(|body| body.data.clone()) {
                if !data.is_empty() {
                    return Some(data);
                }
            }
        }

        if let Some(nested) = &part.parts {
            if let Some(data) = find_part_data(nested, plain_only) {
                return Some(data);
            }
        }
    }

    None
}

/// Message bodies arrive as URL-safe base64; padding is not guaranteed
/// either way, so it is stripped before decoding.
fn decode_body(data: &str) -> Option<String> {
    let trimmed = data.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(trimmed).ok()?;
    Some(String::from_utf8_lossy(&bytes).to_string())
}

fn header_value(headers: &[GmailMessageHeader], target: &str) -> Option<String> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(target))
        .map(|header| header.value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: &str, thread: Option<&str>, subject: Option<&str>, body: Option<&str>) -> MessageView {
        MessageView {
            id: id.to_string(),
            thread_id: thread.map(ToOwned::to_owned),
            subject: subject.map(ToOwned::to_owned),
            from: Some("alice@example.com".to_string()),
            snippet: None,
            body: body.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn decodes_urlsafe_body_with_and_without_padding() {
        assert_eq!(decode_body("aGVsbG8").as_deref(), Some("hello"));
        assert_eq!(decode_body("aGVsbG8=").as_deref(), Some("hello"));
    }

    #[test]
    fn maps_full_message_resource_to_view() {
        let resource = GmailMessageResource {
            id: "msg-1".to_string(),
            thread_id: Some("thread-9".to_string()),
            snippet: Some("it&#39;s moved".to_string()),
            payload: Some(GmailMessagePayload {
                headers: Some(vec![
                    GmailMessageHeader {
                        name: "Subject".to_string(),
                        value: "Standup".to_string(),
                    },
                    GmailMessageHeader {
                        name: "From".to_string(),
                        value: "bob@example.com".to_string(),
                    },
                ]),
                body: None,
                parts: Some(vec![GmailMessagePart {
                    mime_type: Some("text/plain".to_string()),
                    body: Some(GmailMessageBody {
                        data: Some("bW92ZWQgdG8gNSBQTQ".to_string()),
                    }),
                    parts: None,
                }]),
            }),
        };

        let view = resource.into_view();
        assert_eq!(view.thread_id.as_deref(), Some("thread-9"));
        assert_eq!(view.subject.as_deref(), Some("Standup"));
        assert_eq!(view.body.as_deref(), Some("moved to 5 PM"));
        assert_eq!(view.snippet.as_deref(), Some("it's moved"));
    }

    #[test]
    fn prefers_plain_text_part_over_html() {
        let payload = GmailMessagePayload {
            headers: None,
            body: None,
            parts: Some(vec![
                GmailMessagePart {
                    mime_type: Some("text/html".to_string()),
                    body: Some(GmailMessageBody {
                        data: Some("PGI-aHRtbDwvYj4".to_string()),
                    }),
                    parts: None,
                },
                GmailMessagePart {
                    mime_type: Some("text/plain".to_string()),
                    body: Some(GmailMessageBody {
                        data: Some("cGxhaW4".to_string()),
                    }),
                    parts: None,
                },
            ]),
        };

        assert_eq!(payload.body_text().as_deref(), Some("plain"));
    }

    #[test]
    fn groups_by_thread_in_first_encounter_order() {
        let messages = vec![
            view("m1", Some("t-b"), Some("Beta"), Some("first")),
            view("m2", Some("t-a"), Some("Alpha"), Some("second")),
            view("m3", Some("t-b"), None, Some("third")),
        ];

        let threads = group_threads(&messages);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].thread_id, "t-b");
        assert_eq!(threads[0].subject, "Beta");
        assert_eq!(threads[0].messages.len(), 2);
        assert_eq!(threads[1].thread_id, "t-a");
    }

    #[test]
    fn message_without_thread_id_forms_its_own_thread() {
        let messages = vec![view("m1", None, None, Some("hi"))];
        let threads = group_threads(&messages);
        assert_eq!(threads[0].thread_id, "m1");
        assert_eq!(threads[0].subject, "No Subject");
    }

    #[test]
    fn empty_bodies_yield_blank_conversation() {
        let messages = vec![
            view("m1", Some("t"), Some("S"), None),
            view("m2", Some("t"), None, Some("   ")),
        ];

        let threads = group_threads(&messages);
        assert!(threads[0].conversation().trim().is_empty());
    }
}
