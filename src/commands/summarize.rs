use serde::Serialize;

use crate::cli::SummarizeArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::google::gmail;
use crate::google::models::MailThread;
use crate::llm::{ChatClient, prompts};
use crate::output::OutputMode;

pub const NO_CONVERSATION: &str = "No conversation found.";

#[derive(Debug, Serialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub subject: String,
    pub summary: String,
}

pub async fn run(ctx: &AppContext, args: SummarizeArgs) -> AppResult<()> {
    if args.limit == 0 {
        return Err(AppError::InvalidInput(
            "--limit must be greater than 0".to_string(),
        ));
    }

    let chat = ctx.chat()?;
    let access_token = ctx.access_token().await?;

    let messages = ctx.gmail.list_recent(&access_token, args.limit).await?;
    let threads = gmail::group_threads(&messages);

    if threads.is_empty() {
        return ctx.output.emit("no email threads found", &Vec::<ThreadSummary>::new());
    }

    let mut summaries = Vec::with_capacity(threads.len());
    for thread in &threads {
        let summary = summarize_thread(&chat, thread).await?;
        summaries.push(ThreadSummary {
            thread_id: thread.thread_id.clone(),
            subject: thread.subject.clone(),
            summary,
        });
    }

    if ctx.output.mode() == OutputMode::Text {
        for (index, entry) in summaries.iter().enumerate() {
            println!("{}", entry.subject);
            println!("   thread: {}", entry.thread_id);
            println!("   {}", entry.summary);

            if index + 1 < summaries.len() {
                println!();
            }
        }
        return Ok(());
    }

    let text = format!("{} threads summarized", summaries.len());
    ctx.output.emit(&text, &summaries)
}

/// Summarize one thread. Blank conversations short-circuit to a fixed
/// answer; the model is only consulted when there is something to read.
pub async fn summarize_thread(chat: &ChatClient, thread: &MailThread) -> AppResult<String> {
    let conversation = thread.conversation();
    if conversation.trim().is_empty() {
        return Ok(NO_CONVERSATION.to_string());
    }

    let summary = chat.chat(prompts::SUMMARIZE, &conversation).await?;
    Ok(summary.trim().to_string())
}
