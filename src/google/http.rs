use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{AppError, AppResult};

/// Request plumbing shared by the Gmail and Calendar clients: bearer-auth
/// JSON calls against a configurable base URL, with Google's error envelope
/// mapped onto the app error kinds.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    base_url: &str,
    endpoint: &str,
    access_token: &str,
    query: Option<&[(String, String)]>,
) -> AppResult<T> {
    let url = endpoint_url(base_url, endpoint)?;
    let mut request = http.get(url).bearer_auth(access_token);
    if let Some(query) = query {
        request = request.query(query);
    }

    let response = request.send().await?;
    parse_json_response(response).await
}

pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize>(
    http: &Client,
    base_url: &str,
    endpoint: &str,
    access_token: &str,
    query: Option<&[(String, String)]>,
    body: &B,
) -> AppResult<T> {
    let url = endpoint_url(base_url, endpoint)?;
    let mut request = http.post(url).bearer_auth(access_token).json(body);
    if let Some(query) = query {
        request = request.query(query);
    }

    let response = request.send().await?;
    parse_json_response(response).await
}

fn endpoint_url(base_url: &str, endpoint: &str) -> AppResult<Url> {
    let mut url = Url::parse(base_url)?;
    url.set_path(endpoint.trim_start_matches('/'));
    Ok(url)
}

async fn parse_json_response<T: DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(map_api_error(status, &body))
}

pub(crate) fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_api_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "google api authorization failed ({status}): {message}. run `scribe auth login`"
        ));
    }

    AppError::Api(format!("google api request failed ({status}): {message}"))
}

#[derive(Debug, serde::Deserialize)]
struct GoogleApiErrorEnvelope {
    error: GoogleApiError,
}

#[derive(Debug, serde::Deserialize)]
struct GoogleApiError {
    code: Option<u16>,
    status: Option<String>,
    message: Option<String>,
    errors: Option<Vec<GoogleApiErrorDetail>>,
}

#[derive(Debug, serde::Deserialize)]
struct GoogleApiErrorDetail {
    reason: Option<String>,
}

fn parse_api_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<GoogleApiErrorEnvelope>(body).ok()?;
    let mut parts = Vec::new();

    if let Some(message) = envelope.error.message {
        parts.push(message);
    }

    if let Some(status) = envelope.error.status {
        parts.push(format!("status={status}"));
    }

    if let Some(code) = envelope.error.code {
        parts.push(format!("code={code}"));
    }

    if let Some(reason) = envelope
        .error
        .errors
        .and_then(|errors| errors.into_iter().find_map(|detail| detail.reason))
    {
        parts.push(format!("reason={reason}"));
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_unauthorized_as_auth_error() {
        let error = map_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#,
        );

        match error {
            AppError::Auth(message) => {
                assert!(message.contains("invalid authentication credentials"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn maps_not_found_as_api_error() {
        let error = map_api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#,
        );

        match error {
            AppError::Api(message) => {
                assert!(message.contains("Requested entity was not found"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body_when_envelope_is_absent() {
        let error = map_api_error(StatusCode::BAD_REQUEST, "plain text failure");

        match error {
            AppError::Api(message) => assert!(message.contains("plain text failure")),
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
