use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "scribe", version, about = "LLM-assisted email and meeting assistant")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Auth(AuthArgs),
    Send(SendArgs),
    Meet(MeetArgs),
    Summarize(SummarizeArgs),
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    Login,
    Status,
    Logout,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    #[arg(help = "Natural language description of the email to send")]
    pub text: String,
}

#[derive(Debug, Args)]
pub struct MeetArgs {
    #[arg(help = "Natural language description of the meeting to schedule")]
    pub text: String,
    #[arg(
        long,
        help = "Fail instead of prompting when extracted details are incomplete"
    )]
    pub no_input: bool,
}

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    #[arg(long, default_value_t = 10, help = "Maximum messages to scan")]
    pub limit: u32,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1", help = "Address to bind")]
    pub bind: String,
    #[arg(long, default_value_t = 8080, help = "Port to listen on")]
    pub port: u16,
}
