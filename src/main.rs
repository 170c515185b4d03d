use clap::Parser;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = scribe::cli::Cli::parse();

    if let Err(err) = scribe::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
