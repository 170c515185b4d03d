use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::error::{AppError, AppResult};

use super::token::TokenSet;
use super::token_store::TokenStore;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(180);

// Calendar event creation and read-only mailbox access; outbound mail goes
// through SendGrid, so no gmail.send scope is requested.
const SCOPES: &str = "https://www.googleapis.com/auth/calendar.events https://www.googleapis.com/auth/gmail.readonly openid email";

#[derive(Debug, Serialize)]
pub struct AuthLoginResult {
    pub profile: String,
    pub opened_browser: bool,
    pub authorization_url: String,
    pub email: Option<String>,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub profile: String,
    pub logged_in: bool,
    pub email: Option<String>,
    pub expired: Option<bool>,
    pub expires_in_seconds: Option<i64>,
    pub has_refresh_token: Option<bool>,
    pub note: Option<String>,
}

#[derive(Debug, Default)]
pub struct AuthService;

impl AuthService {
    /// NoToken → Valid: interactive consent flow, token persisted on
    /// success.
    pub async fn login<S: TokenStore>(
        profile: &str,
        settings: &Settings,
        store: &S,
    ) -> AppResult<AuthLoginResult> {
        let oauth = GoogleOAuth::from_settings(settings)?;
        let consent = oauth.consent_request()?;

        let opened_browser = open_browser(&consent.url);
        if !opened_browser {
            eprintln!("open this URL in your browser to continue login:\n{}", consent.url);
        }

        let code = capture_callback_code(&oauth.redirect_uri, &consent.state).await?;
        let mut token = oauth.exchange_code(&code, &consent.verifier).await?;
        token.email = oauth.account_email(&token.access_token).await;
        store.save(profile, &token)?;

        Ok(AuthLoginResult {
            profile: profile.to_string(),
            opened_browser,
            authorization_url: consent.url,
            email: token.email,
            note: "oauth login completed and token stored".to_string(),
        })
    }

    /// Expired → Valid: silent refresh against the stored refresh
    /// credential, preserving it when the provider omits a replacement.
    pub async fn refresh<S: TokenStore>(
        profile: &str,
        settings: &Settings,
        store: &S,
    ) -> AppResult<TokenSet> {
        let current = store.load(profile)?.ok_or_else(|| {
            AppError::InvalidInput("not logged in. run `scribe auth login`".to_string())
        })?;

        if !current.is_expired(SystemTime::now()) {
            return Ok(current);
        }

        debug!(profile, "access token expired, refreshing");

        let refresh_token = current.refresh_token.clone().ok_or_else(|| {
            AppError::Auth(
                "access token expired and no refresh token is stored. run `scribe auth login`"
                    .to_string(),
            )
        })?;

        let oauth = GoogleOAuth::from_settings(settings)?;
        let mut refreshed = oauth.refresh(&refresh_token).await?;
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }
        if refreshed.email.is_none() {
            refreshed.email = current.email;
        }

        store.save(profile, &refreshed)?;
        Ok(refreshed)
    }

    pub async fn status<S: TokenStore>(profile: &str, store: &S) -> AppResult<AuthStatus> {
        let Some(token) = store.load(profile)? else {
            return Ok(AuthStatus {
                profile: profile.to_string(),
                logged_in: false,
                email: None,
                expired: None,
                expires_in_seconds: None,
                has_refresh_token: None,
                note: Some("no token found".to_string()),
            });
        };

        let now = SystemTime::now();
        Ok(AuthStatus {
            profile: profile.to_string(),
            logged_in: true,
            email: token.email.clone(),
            expired: Some(token.is_expired(now)),
            expires_in_seconds: token.expires_in_seconds(now),
            has_refresh_token: Some(token.has_refresh_token()),
            note: Some("token loaded from local store".to_string()),
        })
    }

    pub async fn logout<S: TokenStore>(profile: &str, store: &S) -> AppResult<AuthStatus> {
        let note = match store.load(profile)? {
            Some(token) => {
                let credential = token
                    .refresh_token
                    .as_deref()
                    .unwrap_or(token.access_token.as_str());

                match revoke(credential).await {
                    Ok(()) => "remote token revoked and local credentials removed".to_string(),
                    Err(err) => format!("local credentials removed (revoke failed: {err})"),
                }
            }
            None => "local credentials removed".to_string(),
        };

        store.clear(profile)?;

        Ok(AuthStatus {
            profile: profile.to_string(),
            logged_in: false,
            email: None,
            expired: None,
            expires_in_seconds: None,
            has_refresh_token: None,
            note: Some(note),
        })
    }
}

struct GoogleOAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
}

/// Pending consent: the URL the user visits plus the PKCE verifier and
/// state nonce needed to finish the exchange.
struct ConsentRequest {
    url: String,
    verifier: String,
    state: String,
}

impl GoogleOAuth {
    fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            client_id: settings.client_id()?.to_string(),
            client_secret: settings.client_secret().map(ToOwned::to_owned),
            redirect_uri: settings.redirect_uri(),
        })
    }

    fn consent_request(&self) -> AppResult<ConsentRequest> {
        let state = random_token(32);
        let verifier = random_token(96);

        let mut url = Url::parse(AUTH_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", SCOPES)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce_challenge(&verifier))
            .append_pair("code_challenge_method", "S256");

        Ok(ConsentRequest {
            url: url.to_string(),
            verifier,
            state,
        })
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> AppResult<TokenSet> {
        let mut form = HashMap::from([
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("client_id", self.client_id.clone()),
            ("redirect_uri", self.redirect_uri.clone()),
            ("code_verifier", verifier.to_string()),
        ]);
        if let Some(secret) = &self.client_secret {
            form.insert("client_secret", secret.clone());
        }

        self.token_request(&form).await
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenSet> {
        let mut form = HashMap::from([
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("client_id", self.client_id.clone()),
        ]);
        if let Some(secret) = &self.client_secret {
            form.insert("client_secret", secret.clone());
        }

        self.token_request(&form).await
    }

    async fn token_request(&self, form: &HashMap<&str, String>) -> AppResult<TokenSet> {
        let response = self.http.post(TOKEN_ENDPOINT).form(form).send().await?;
        let status = response.status();

        if status.is_success() {
            let payload: TokenResponse = response.json().await?;
            return Ok(TokenSet {
                access_token: payload.access_token,
                refresh_token: payload.refresh_token,
                expires_at_unix: expires_at_unix(payload.expires_in),
                token_type: payload.token_type,
                scope: payload.scope,
                email: None,
            });
        }

        let body = response.text().await?;
        match serde_json::from_str::<TokenErrorResponse>(&body) {
            Ok(payload) => {
                let error = payload
                    .error
                    .unwrap_or_else(|| "unknown_oauth_error".to_string());
                let description = payload
                    .error_description
                    .unwrap_or_else(|| "no description".to_string());
                Err(AppError::Auth(format!(
                    "oauth token exchange failed ({status}): {error} ({description})"
                )))
            }
            Err(_) => Err(AppError::Auth(format!(
                "oauth token exchange failed ({status}): {body}"
            ))),
        }
    }

    /// Best-effort account lookup; login proceeds without an email when the
    /// userinfo endpoint is unavailable.
    async fn account_email(&self, access_token: &str) -> Option<String> {
        let response = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        response.json::<UserInfo>().await.ok()?.email
    }
}

async fn revoke(credential: &str) -> AppResult<()> {
    let response = reqwest::Client::new()
        .post(REVOKE_ENDPOINT)
        .form(&HashMap::from([("token", credential.to_string())]))
        .send()
        .await?;

    if response.status().is_success() {
        return Ok(());
    }

    Err(AppError::Auth(format!(
        "revoke endpoint returned {}",
        response.status()
    )))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    token_type: Option<String>,
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: Option<String>,
}

fn expires_at_unix(expires_in: Option<u64>) -> Option<u64> {
    let expires_in = expires_in?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(now.saturating_add(expires_in))
}

/// Bind the redirect address, accept one request, and pull the
/// authorization code out of it.
async fn capture_callback_code(redirect_uri: &str, expected_state: &str) -> AppResult<String> {
    let redirect = Url::parse(redirect_uri)?;
    if redirect.scheme() != "http" {
        return Err(AppError::Config(
            "redirect_uri must use http for local callback capture".to_string(),
        ));
    }

    let host = redirect
        .host_str()
        .ok_or_else(|| AppError::Config("redirect_uri is missing host".to_string()))?;
    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| AppError::Config("redirect_uri is missing port".to_string()))?;
    let expected_path = redirect.path().to_string();

    let listener = TcpListener::bind((host, port)).await.map_err(|err| {
        AppError::Auth(format!(
            "failed to bind oauth callback listener on {host}:{port}: {err}"
        ))
    })?;

    time::timeout(CALLBACK_TIMEOUT, async {
        let (mut stream, _) = listener.accept().await?;

        let mut buf = vec![0_u8; 8192];
        let size = stream.read(&mut buf).await?;
        if size == 0 {
            return Err(AppError::Auth("empty oauth callback request".to_string()));
        }

        let request = String::from_utf8_lossy(&buf[..size]);
        let request_line = request
            .lines()
            .next()
            .ok_or_else(|| AppError::Auth("malformed oauth callback request".to_string()))?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default();
        let target = parts.next().unwrap_or_default();

        if method != "GET" {
            respond(&mut stream, "405 Method Not Allowed", "oauth callback only accepts GET requests")
                .await?;
            return Err(AppError::Auth(
                "oauth callback received non-GET request".to_string(),
            ));
        }

        match extract_callback_code(target, &expected_path, expected_state) {
            Ok(code) => {
                respond(
                    &mut stream,
                    "200 OK",
                    "scribe is authorized. you can return to the terminal.",
                )
                .await?;
                Ok(code)
            }
            Err(err) => {
                let _ = respond(
                    &mut stream,
                    "400 Bad Request",
                    &format!("oauth callback error: {err}"),
                )
                .await;
                Err(err)
            }
        }
    })
    .await
    .map_err(|_| AppError::Auth("timed out waiting for oauth callback".to_string()))?
}

fn extract_callback_code(
    target: &str,
    expected_path: &str,
    expected_state: &str,
) -> AppResult<String> {
    let callback_url = Url::parse(&format!("http://localhost{target}"))?;
    if callback_url.path() != expected_path {
        return Err(AppError::Auth(format!(
            "oauth callback path mismatch: expected {expected_path}, got {}",
            callback_url.path()
        )));
    }

    let mut code = None;
    let mut state = None;
    let mut denial = None;
    let mut denial_description = None;

    for (key, value) in callback_url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => denial = Some(value.to_string()),
            "error_description" => denial_description = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = denial {
        let description = denial_description.unwrap_or_else(|| "no description".to_string());
        return Err(AppError::Auth(format!(
            "oauth authorization failed: {error} ({description})"
        )));
    }

    let received_state = state
        .ok_or_else(|| AppError::Auth("oauth callback missing state parameter".to_string()))?;
    if received_state != expected_state {
        return Err(AppError::Auth(
            "oauth state mismatch; aborting login".to_string(),
        ));
    }

    code.ok_or_else(|| AppError::Auth("oauth callback missing code parameter".to_string()))
}

async fn respond(stream: &mut TcpStream, status: &str, message: &str) -> AppResult<()> {
    let body = format!(
        "<!doctype html><html><body><p>{}</p></body></html>",
        html_escape::encode_text(message)
    );
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

fn random_token(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());
    URL_SAFE_NO_PAD.encode(bytes)
}

fn pkce_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

fn open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        return std::process::Command::new("open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "linux")]
    {
        return std::process::Command::new("xdg-open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }

    #[cfg(target_os = "windows")]
    {
        return std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .status()
            .is_ok_and(|status| status.success());
    }

    #[allow(unreachable_code)]
    false
}
