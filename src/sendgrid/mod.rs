pub mod client;
pub mod mail;

pub use client::SendGridClient;

use serde::Serialize;
use tracing::{info, warn};

use crate::llm::extract::EmailRequest;
use crate::threads::ThreadStore;

/// Typed result of every email send. Provider faults are converted here,
/// at the action boundary, and never propagate to the caller as errors.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Action executor for the email flow: resolve or allocate the recipient's
/// thread id, attach it to the outbound message, and submit.
pub async fn send_email(
    client: &SendGridClient,
    threads: &dyn ThreadStore,
    sender: &str,
    request: &EmailRequest,
) -> SendOutcome {
    let thread_id = crate::threads::resolve_thread_id(threads, &request.recipient);
    let payload = mail::build_payload(sender, request, &thread_id);

    match client.send(&payload).await {
        Ok(response_code) => {
            info!(recipient = %request.recipient, thread_id, "email accepted for delivery");
            SendOutcome {
                status: OutcomeStatus::Success,
                message: format!("Email sent to {}", request.recipient),
                response_code: Some(response_code),
                thread_id: Some(thread_id),
            }
        }
        Err(err) => {
            warn!(kind = err.kind(), recipient = %request.recipient, "email send failed");
            SendOutcome {
                status: OutcomeStatus::Error,
                message: err.to_string(),
                response_code: None,
                thread_id: None,
            }
        }
    }
}
