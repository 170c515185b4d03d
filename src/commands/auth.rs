use std::io::{self, IsTerminal, Write};

use crate::auth::{AuthService, AuthStatus};
use crate::cli::AuthCommand;
use crate::config::{self, Settings};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Login => login(ctx).await,
        AuthCommand::Status => {
            let status = AuthService::status(&ctx.profile, &ctx.token_store).await?;
            ctx.output.emit(&status_line(&status), &status)
        }
        AuthCommand::Logout => {
            let status = AuthService::logout(&ctx.profile, &ctx.token_store).await?;
            let text = format!("{}: logged out", status.profile);
            ctx.output.emit(&text, &status)
        }
    }
}

async fn login(ctx: &AppContext) -> AppResult<()> {
    let settings = ensure_oauth_client_config(ctx)?;
    let result = AuthService::login(&ctx.profile, &settings, &ctx.token_store).await?;

    let text = match result.email.as_deref() {
        Some(email) => format!("{}: logged in as {email}", result.profile),
        None => format!("{}: {}", result.profile, result.note),
    };
    ctx.output.emit(&text, &result)
}

fn status_line(status: &AuthStatus) -> String {
    if !status.logged_in {
        return format!("{}: logged out", status.profile);
    }

    let account = status
        .email
        .as_deref()
        .map(|email| format!(" as {email}"))
        .unwrap_or_default();
    let refresh_hint = match status.has_refresh_token {
        Some(true) => " (refresh available)",
        Some(false) => " (no refresh token)",
        None => "",
    };

    format!("{}: logged in{account}{refresh_hint}", status.profile)
}

/// The consent flow needs an OAuth client id and secret. When the profile
/// lacks them, prompt interactively and persist; in a non-interactive
/// session, fail with the path to edit instead.
fn ensure_oauth_client_config(ctx: &AppContext) -> AppResult<Settings> {
    let mut settings = ctx.settings.clone();
    let needs_client_id = is_blank(settings.client_id.as_deref());
    let needs_client_secret = is_blank(settings.client_secret.as_deref());

    if !needs_client_id && !needs_client_secret {
        return Ok(settings);
    }

    let settings_path = ctx.paths.settings_file(&ctx.profile);
    if !io::stdin().is_terminal() {
        return Err(AppError::Config(format!(
            "missing oauth client config in {}. run `scribe auth login` in an interactive terminal to be prompted, or add client_id/client_secret manually",
            settings_path.display(),
        )));
    }

    println!(
        "OAuth client config is missing for profile `{}`.",
        ctx.profile
    );
    println!("Settings will be saved to {}.", settings_path.display());

    if needs_client_id {
        settings.client_id = Some(prompt_required("OAuth client_id: ")?);
    }
    if needs_client_secret {
        settings.client_secret = Some(prompt_required("OAuth client_secret: ")?);
    }

    let default_redirect = settings.redirect_uri();
    let redirect_uri = prompt_line(&format!("OAuth redirect_uri [{default_redirect}]: "))?;
    settings.redirect_uri = Some(if redirect_uri.is_empty() {
        default_redirect
    } else {
        redirect_uri
    });

    config::save_settings(&ctx.paths, &ctx.profile, &settings)?;
    println!("Saved profile settings to {}.", settings_path.display());

    Ok(settings)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).is_none_or(str::is_empty)
}

pub(crate) fn prompt_required(prompt: &str) -> AppResult<String> {
    loop {
        let value = prompt_line(prompt)?;
        if !value.is_empty() {
            return Ok(value);
        }
        eprintln!("value is required");
    }
}

pub(crate) fn prompt_line(prompt: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()?;

    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}
