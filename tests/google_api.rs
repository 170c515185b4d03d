use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scribe::google::calendar::{self, CalendarClient};
use scribe::google::gmail::{self, GmailClient};
use scribe::llm::extract::MeetingRequest;

fn meeting_request() -> MeetingRequest {
    MeetingRequest {
        title: "Project Sync".to_string(),
        date: "2026-08-08".to_string(),
        start_time: "15:00".to_string(),
        end_time: "15:30".to_string(),
        attendees: vec!["john@example.com".to_string()],
    }
}

#[tokio::test]
async fn fetches_and_groups_recent_messages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages"))
        .and(query_param("maxResults", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [{"id": "m1"}, {"id": "m2"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // "Lunch tomorrow?" / "Sounds good." as url-safe base64.
    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m1",
            "threadId": "t-1",
            "snippet": "Lunch tomorrow?",
            "payload": {
                "headers": [
                    {"name": "Subject", "value": "Lunch"},
                    {"name": "From", "value": "alice@example.com"}
                ],
                "parts": [{
                    "mimeType": "text/plain",
                    "body": {"data": "THVuY2ggdG9tb3Jyb3c_"}
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gmail/v1/users/me/messages/m2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m2",
            "threadId": "t-1",
            "payload": {
                "headers": [{"name": "From", "value": "bob@example.com"}],
                "body": {"data": "U291bmRzIGdvb2Qu"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GmailClient::with_base_url(server.uri());
    let messages = client.list_recent("token", 2).await.expect("messages");

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].body.as_deref(), Some("Lunch tomorrow?"));
    assert_eq!(messages[1].body.as_deref(), Some("Sounds good."));

    let threads = gmail::group_threads(&messages);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].thread_id, "t-1");
    assert_eq!(threads[0].subject, "Lunch");
    assert!(threads[0].conversation().contains("From: alice@example.com"));
    assert!(threads[0].conversation().contains("Sounds good."));
}

#[tokio::test]
async fn inserts_event_with_conference_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(query_param("conferenceDataVersion", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt-1",
            "hangoutLink": "https://meet.google.com/abc-defg-hij"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CalendarClient::with_base_url(server.uri());
    let start = "2026-08-08T15:00:00".parse().expect("start");
    let end = "2026-08-08T15:30:00".parse().expect("end");

    let outcome = calendar::schedule_meeting(
        &client,
        "token",
        &meeting_request(),
        &start,
        &end,
        "UTC",
    )
    .await;

    assert!(outcome.is_scheduled());
    assert_eq!(
        outcome.meet_link.as_deref(),
        Some("https://meet.google.com/abc-defg-hij")
    );

    let requests = server.received_requests().await.expect("requests");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("body");
    assert_eq!(
        body["conferenceData"]["createRequest"]["requestId"],
        "meet-202608081500"
    );
    assert_eq!(body["start"]["dateTime"], "2026-08-08T15:00:00");
}

#[tokio::test]
async fn provider_failure_yields_error_outcome_without_link() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Insufficient permissions", "status": "PERMISSION_DENIED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CalendarClient::with_base_url(server.uri());
    let start = "2026-08-08T15:00:00".parse().expect("start");
    let end = "2026-08-08T15:30:00".parse().expect("end");

    let outcome =
        calendar::schedule_meeting(&client, "token", &meeting_request(), &start, &end, "UTC").await;

    assert!(!outcome.is_scheduled());
    assert!(outcome.meet_link.is_none());
    assert!(outcome.message.contains("Insufficient permissions"));
}
