use std::io::{self, IsTerminal};

use chrono::Local;

use crate::cli::MeetArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::google::calendar;
use crate::llm::extract::{self, MeetingDetails};
use crate::when;

use super::auth::{prompt_line, prompt_required};

pub async fn run(ctx: &AppContext, args: MeetArgs) -> AppResult<()> {
    let input = args.text.trim();
    if input.is_empty() {
        return Err(AppError::InvalidInput("Input text is required".to_string()));
    }

    let chat = ctx.chat()?;
    let mut details = extract::meeting_details(&chat, input).await?;

    // Partial extractions never reach the calendar API: either the user
    // fills in the gaps interactively or the command stops here.
    if !details.is_complete() {
        if args.no_input || !io::stdin().is_terminal() {
            return Err(AppError::Incomplete(format!(
                "missing meeting details: {}",
                details.missing_fields().join(", ")
            )));
        }
        details = fill_missing_details(details)?;
    }

    let request = details.into_request()?;

    let anchor = Local::now();
    let start = when::resolve(&request.date, &request.start_time, anchor)?;
    let end = when::resolve(&request.date, &request.end_time, anchor)?;

    let access_token = ctx.access_token().await?;
    let outcome = calendar::schedule_meeting(
        &ctx.calendar,
        &access_token,
        &request,
        &start,
        &end,
        &ctx.settings.timezone(),
    )
    .await;

    let text = if outcome.is_scheduled() {
        match outcome.meet_link.as_deref() {
            Some(link) => format!("{}: {link}", outcome.message),
            None => format!("{} (no join link returned)", outcome.message),
        }
    } else {
        format!("scheduling failed: {}", outcome.message)
    };
    ctx.output.emit(&text, &outcome)?;

    if outcome.is_scheduled() {
        Ok(())
    } else {
        Err(AppError::Api(outcome.message))
    }
}

/// Manual-entry fallback: prompt for exactly the fields the extractor
/// could not fill, keeping everything it did.
fn fill_missing_details(mut details: MeetingDetails) -> AppResult<MeetingDetails> {
    println!("Some details are missing. Please fill in the required fields.");

    for field in details.missing_fields() {
        match field {
            "title" => details.title = Some(prompt_required("Meeting title: ")?),
            "date" => details.date = Some(prompt_required("Date (e.g. 2026-08-08 or tomorrow): ")?),
            "start_time" => {
                details.start_time = Some(prompt_required("Start time (e.g. 15:00 or 3 PM): ")?)
            }
            "end_time" => {
                details.end_time = Some(prompt_required("End time (e.g. 15:30 or 3:30 PM): ")?)
            }
            "attendees" => {
                let raw = prompt_line("Attendees (comma-separated emails): ")?;
                details.attendees = Some(
                    raw.split(',')
                        .map(|email| email.trim().to_string())
                        .filter(|email| !email.is_empty())
                        .collect(),
                );
            }
            _ => {}
        }
    }

    Ok(details)
}
