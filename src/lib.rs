pub mod app;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod google;
pub mod llm;
pub mod output;
pub mod sendgrid;
pub mod server;
pub mod threads;
pub mod when;

use cli::Cli;
use error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    app::run(cli).await
}
