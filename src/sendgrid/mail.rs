use std::collections::BTreeMap;

use serde::Serialize;

use crate::llm::extract::EmailRequest;

/// SendGrid v3 `mail/send` payload. The recipient's thread id rides along
/// as a personalization custom arg so delivery-side events can be grouped
/// back into conversations.
#[derive(Debug, Clone, Serialize)]
pub struct MailPayload {
    pub personalizations: Vec<Personalization>,
    pub from: EmailAddress,
    pub subject: String,
    pub content: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Personalization {
    pub to: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmailAddress {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

pub fn build_payload(sender: &str, request: &EmailRequest, thread_id: &str) -> MailPayload {
    let mut custom_args = BTreeMap::new();
    custom_args.insert("thread_id".to_string(), thread_id.to_string());

    MailPayload {
        personalizations: vec![Personalization {
            to: vec![EmailAddress {
                email: request.recipient.clone(),
            }],
            custom_args,
        }],
        from: EmailAddress {
            email: sender.to_string(),
        },
        subject: request.subject.clone(),
        content: vec![Content {
            kind: "text/plain".to_string(),
            value: request.body.clone(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_thread_id_custom_arg() {
        let request = EmailRequest {
            recipient: "john@example.com".to_string(),
            subject: "Meeting Update".to_string(),
            body: "The meeting moved to 5 PM.".to_string(),
        };

        let payload = build_payload("assistant@example.com", &request, "thread-0011223344556677");
        let json = serde_json::to_value(&payload).expect("serialize");

        assert_eq!(
            json["personalizations"][0]["to"][0]["email"],
            "john@example.com"
        );
        assert_eq!(
            json["personalizations"][0]["custom_args"]["thread_id"],
            "thread-0011223344556677"
        );
        assert_eq!(json["from"]["email"], "assistant@example.com");
        assert_eq!(json["content"][0]["type"], "text/plain");
    }
}
