use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scribe::llm::extract::EmailRequest;
use scribe::sendgrid::{self, SendGridClient};
use scribe::threads::MemoryThreadStore;

fn request() -> EmailRequest {
    EmailRequest {
        recipient: "john@example.com".to_string(),
        subject: "Meeting Update".to_string(),
        body: "Dear John,\n\nThe meeting moved to 5 PM.\n\nBest regards".to_string(),
    }
}

#[tokio::test]
async fn accepted_send_reports_success_with_thread_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("authorization", "Bearer sg-key"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = SendGridClient::with_base_url(server.uri(), "sg-key");
    let threads = MemoryThreadStore::new();

    let outcome = sendgrid::send_email(&client, &threads, "assistant@example.com", &request()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.response_code, Some(202));
    assert_eq!(outcome.message, "Email sent to john@example.com");
    assert!(
        outcome
            .thread_id
            .as_deref()
            .is_some_and(|id| id.starts_with("thread-"))
    );
}

/// Provider faults are converted into an error outcome at the executor
/// boundary; they never surface as an Err from the send path.
#[tokio::test]
async fn provider_rejection_becomes_error_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errors": [{"message": "The provided authorization grant is invalid"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SendGridClient::with_base_url(server.uri(), "bad-key");
    let threads = MemoryThreadStore::new();

    let outcome = sendgrid::send_email(&client, &threads, "assistant@example.com", &request()).await;

    assert!(!outcome.is_success());
    assert!(outcome.response_code.is_none());
    assert!(outcome.message.contains("authorization grant"));
}
