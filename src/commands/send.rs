use crate::cli::SendArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::llm::draft;
use crate::llm::extract::{self, EmailRequest};
use crate::sendgrid;
use crate::threads::MemoryThreadStore;

pub async fn run(ctx: &AppContext, args: SendArgs) -> AppResult<()> {
    let input = args.text.trim();
    if input.is_empty() {
        return Err(AppError::InvalidInput("Input text is required".to_string()));
    }

    let chat = ctx.chat()?;
    let client = ctx.sendgrid()?;
    let sender = ctx.settings.sender_email()?;

    let details = extract::email_details(&chat, input).await?;
    let extracted = details.into_request()?;

    // The extracted body is context for the drafting call, not the final
    // text; the draft replaces it wholesale.
    let body = draft::draft_body(&chat, &extracted.recipient, &extracted.body).await;
    let request = EmailRequest { body, ..extracted };

    let threads = MemoryThreadStore::new();
    let outcome = sendgrid::send_email(&client, &threads, &sender, &request).await;

    let text = if outcome.is_success() {
        format!(
            "{} (thread {})",
            outcome.message,
            outcome.thread_id.as_deref().unwrap_or("unknown")
        )
    } else {
        format!("send failed: {}", outcome.message)
    };
    ctx.output.emit(&text, &outcome)?;

    if outcome.is_success() {
        Ok(())
    } else {
        Err(AppError::Api(outcome.message))
    }
}
