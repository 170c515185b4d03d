use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::cli::ServeArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::server::{self, ServerState};
use crate::threads::MemoryThreadStore;

pub async fn run(ctx: &AppContext, args: ServeArgs) -> AppResult<()> {
    let state = Arc::new(ServerState {
        chat: ctx.chat()?,
        sendgrid: ctx.sendgrid()?,
        sender: ctx.settings.sender_email()?,
        threads: MemoryThreadStore::new(),
    });

    let app = server::router(state);
    let addr = format!("{}:{}", args.bind, args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(%addr, "send-email endpoint up");
    println!("listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
