use serde::Serialize;

/// One fetched mailbox message, already flattened from the provider
/// resource: headers of interest plus the decoded body text.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: String,
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub from: Option<String>,
    pub snippet: Option<String>,
    pub body: Option<String>,
}

/// Messages grouped under one provider thread id, in arrival order within
/// the thread. Rebuilt on every run; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MailThread {
    pub thread_id: String,
    pub subject: String,
    pub messages: Vec<String>,
}

impl MailThread {
    pub fn conversation(&self) -> String {
        self.messages.join("\n")
    }
}

/// Created calendar event, reduced to what the caller presents.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: String,
    pub hangout_link: Option<String>,
    pub html_link: Option<String>,
}
