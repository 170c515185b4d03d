use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::llm::extract::MeetingRequest;
use crate::when;

use super::http;
use super::models::EventView;

const CALENDAR_API_BASE_URL: &str = "https://www.googleapis.com";
const EVENTS_ENDPOINT: &str = "/calendar/v3/calendars/primary/events";

#[derive(Debug, Clone)]
pub struct CalendarClient {
    http: Client,
    base_url: String,
}

impl CalendarClient {
    pub fn new() -> Self {
        Self::with_base_url(CALENDAR_API_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Insert the event on the primary calendar, asking the provider to
    /// create conference data for it.
    pub async fn insert_event(
        &self,
        event: &EventPayload,
        access_token: &str,
    ) -> AppResult<EventView> {
        let query = vec![("conferenceDataVersion".to_string(), "1".to_string())];
        let resource: EventResource = http::post_json(
            &self.http,
            &self.base_url,
            EVENTS_ENDPOINT,
            access_token,
            Some(&query),
            event,
        )
        .await?;

        Ok(EventView {
            id: resource.id,
            hangout_link: resource.hangout_link,
            html_link: resource.html_link,
        })
    }
}

impl Default for CalendarClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed result of a scheduling attempt. Provider faults are converted at
/// this boundary so a failed insert reports no link instead of tearing the
/// caller down.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    pub status: ScheduleStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Error,
}

impl ScheduleOutcome {
    pub fn is_scheduled(&self) -> bool {
        self.status == ScheduleStatus::Scheduled
    }
}

/// Action executor for the meeting flow. Date/time resolution happens
/// before this call; here the event is built and submitted.
pub async fn schedule_meeting(
    client: &CalendarClient,
    access_token: &str,
    request: &MeetingRequest,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    timezone: &str,
) -> ScheduleOutcome {
    let event = meeting_event(request, start, end, timezone);

    match client.insert_event(&event, access_token).await {
        Ok(view) => {
            info!(event_id = %view.id, "calendar event created");
            ScheduleOutcome {
                status: ScheduleStatus::Scheduled,
                message: format!("Meeting `{}` scheduled", request.title),
                event_id: Some(view.id),
                meet_link: view.hangout_link.or(view.html_link),
            }
        }
        Err(err) => {
            warn!(kind = err.kind(), "calendar event creation failed");
            ScheduleOutcome {
                status: ScheduleStatus::Error,
                message: err.to_string(),
                event_id: None,
                meet_link: None,
            }
        }
    }
}

/// Client-supplied idempotency token for conference creation, derived from
/// the date and start time only: retrying an identical submission reuses
/// the same id instead of minting a second conference room.
pub fn conference_request_id(date: &str, start_time: &str) -> String {
    format!(
        "meet-{}{}",
        date.replace('-', ""),
        start_time.replace(':', "")
    )
}

/// Build the event payload for a validated meeting request with already
/// resolved start/end instants.
pub fn meeting_event(
    request: &MeetingRequest,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    timezone: &str,
) -> EventPayload {
    EventPayload {
        summary: request.title.clone(),
        description: "Scheduled by scribe.".to_string(),
        start: EventDateTime {
            date_time: when::to_iso(start),
            time_zone: timezone.to_string(),
        },
        end: EventDateTime {
            date_time: when::to_iso(end),
            time_zone: timezone.to_string(),
        },
        attendees: request
            .attendees
            .iter()
            .map(|email| EventAttendee {
                email: email.clone(),
            })
            .collect(),
        conference_data: ConferenceData {
            create_request: ConferenceCreateRequest {
                request_id: conference_request_id(&request.date, &request.start_time),
                conference_solution_key: ConferenceSolutionKey {
                    kind: "hangoutsMeet".to_string(),
                },
            },
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<EventAttendee>,
    #[serde(rename = "conferenceData")]
    pub conference_data: ConferenceData,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventAttendee {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConferenceData {
    #[serde(rename = "createRequest")]
    pub create_request: ConferenceCreateRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConferenceCreateRequest {
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(rename = "conferenceSolutionKey")]
    pub conference_solution_key: ConferenceSolutionKey,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConferenceSolutionKey {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct EventResource {
    id: String,
    #[serde(rename = "hangoutLink")]
    hangout_link: Option<String>,
    #[serde(rename = "htmlLink")]
    html_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> MeetingRequest {
        MeetingRequest {
            title: "Project Sync".to_string(),
            date: "2026-08-08".to_string(),
            start_time: "15:00".to_string(),
            end_time: "15:30".to_string(),
            attendees: vec!["john@example.com".to_string()],
        }
    }

    #[test]
    fn conference_id_is_deterministic_in_date_and_start() {
        let first = conference_request_id("2026-08-08", "15:00");
        let second = conference_request_id("2026-08-08", "15:00");
        assert_eq!(first, second);
        assert_eq!(first, "meet-202608081500");
    }

    #[test]
    fn conference_id_differs_for_differing_inputs() {
        let base = conference_request_id("2026-08-08", "15:00");
        assert_ne!(base, conference_request_id("2026-08-09", "15:00"));
        assert_ne!(base, conference_request_id("2026-08-08", "15:30"));
    }

    #[test]
    fn event_payload_requests_conference_creation() {
        let start = "2026-08-08T15:00:00".parse::<NaiveDateTime>().expect("start");
        let end = "2026-08-08T15:30:00".parse::<NaiveDateTime>().expect("end");
        let payload = meeting_event(&request(), &start, &end, "UTC");

        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["summary"], "Project Sync");
        assert_eq!(json["start"]["dateTime"], "2026-08-08T15:00:00");
        assert_eq!(json["start"]["timeZone"], "UTC");
        assert_eq!(
            json["conferenceData"]["createRequest"]["requestId"],
            "meet-202608081500"
        );
        assert_eq!(
            json["conferenceData"]["createRequest"]["conferenceSolutionKey"]["type"],
            "hangoutsMeet"
        );
        assert_eq!(json["attendees"][0]["email"], "john@example.com");
    }
}
