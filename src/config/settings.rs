use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8787/callback";
const DEFAULT_LLM_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEZONE: &str = "UTC";

/// Per-profile settings file. Secrets (SendGrid and LLM API keys) are never
/// stored here; they come from the environment, matching the `.env` layout
/// the deployment uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub llm_api_base: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
}

impl Settings {
    pub fn client_id(&self) -> AppResult<&str> {
        self.client_id.as_deref().ok_or_else(|| {
            AppError::Config(
                "missing oauth client_id in profile settings. add it to your profile json"
                    .to_string(),
            )
        })
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }

    /// Sender address for outbound SendGrid mail. The profile value wins;
    /// `SMTP_EMAIL` is the environment fallback.
    pub fn sender_email(&self) -> AppResult<String> {
        if let Some(sender) = self.sender_email.clone() {
            return Ok(sender);
        }

        env_var("SMTP_EMAIL").ok_or_else(|| {
            AppError::Config(
                "missing sender address: set sender_email in the profile or SMTP_EMAIL in the environment"
                    .to_string(),
            )
        })
    }

    pub fn sendgrid_api_key(&self) -> AppResult<String> {
        env_var("SENDGRID_API_KEY")
            .ok_or_else(|| AppError::Config("SENDGRID_API_KEY is not set".to_string()))
    }

    pub fn llm_api_key(&self) -> AppResult<String> {
        env_var("LLM_API_KEY")
            .ok_or_else(|| AppError::Config("LLM_API_KEY is not set".to_string()))
    }

    pub fn llm_api_base(&self) -> String {
        self.llm_api_base
            .clone()
            .or_else(|| env_var("LLM_API_BASE"))
            .unwrap_or_else(|| DEFAULT_LLM_API_BASE.to_string())
    }

    pub fn llm_model(&self) -> String {
        self.llm_model
            .clone()
            .or_else(|| env_var("LLM_MODEL"))
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string())
    }

    pub fn timezone(&self) -> String {
        self.timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}

pub fn save(path: PathBuf, settings: &Settings) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(&path, payload)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_sender_wins_over_environment() {
        let settings = Settings {
            sender_email: Some("assistant@example.com".to_string()),
            ..Settings::default()
        };

        assert_eq!(
            settings.sender_email().expect("sender"),
            "assistant@example.com"
        );
    }

    #[test]
    fn llm_defaults_apply_when_unset() {
        let settings = Settings::default();
        assert_eq!(settings.llm_api_base(), DEFAULT_LLM_API_BASE);
        assert_eq!(settings.llm_model(), DEFAULT_LLM_MODEL);
        assert_eq!(settings.timezone(), DEFAULT_TIMEZONE);
    }
}
