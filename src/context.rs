use crate::auth::token_store::TokenStore;
use crate::auth::{AuthService, FileTokenStore};
use crate::config::{self, AppPaths, Settings};
use crate::error::{AppError, AppResult};
use crate::google::{CalendarClient, GmailClient};
use crate::llm::ChatClient;
use crate::output::Output;
use crate::sendgrid::SendGridClient;

#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub verbose: u8,
    pub paths: AppPaths,
    pub settings: Settings,
    pub token_store: FileTokenStore,
    pub gmail: GmailClient,
    pub calendar: CalendarClient,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool, verbose: u8) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let token_store = FileTokenStore::new(paths.tokens_dir());
        let gmail = GmailClient::new();
        let calendar = CalendarClient::new();
        let output = Output::new(json);

        Ok(Self {
            profile,
            verbose,
            paths,
            settings,
            token_store,
            gmail,
            calendar,
            output,
        })
    }

    /// {NoToken, Expired, Valid} resolution for the Google flows: missing
    /// tokens point at the login command, expired ones are silently
    /// refreshed, valid ones are reused as-is.
    pub async fn access_token(&self) -> AppResult<String> {
        let token = self.token_store.load(&self.profile)?.ok_or_else(|| {
            AppError::InvalidInput("not logged in. run `scribe auth login`".to_string())
        })?;

        if token.is_expired(std::time::SystemTime::now()) {
            let refreshed =
                AuthService::refresh(&self.profile, &self.settings, &self.token_store).await?;
            return Ok(refreshed.access_token);
        }

        Ok(token.access_token)
    }

    pub fn chat(&self) -> AppResult<ChatClient> {
        let api_key = self.settings.llm_api_key()?;
        Ok(ChatClient::new(
            self.settings.llm_api_base(),
            api_key,
            self.settings.llm_model(),
        ))
    }

    pub fn sendgrid(&self) -> AppResult<SendGridClient> {
        let api_key = self.settings.sendgrid_api_key()?;
        Ok(SendGridClient::new(api_key))
    }
}
