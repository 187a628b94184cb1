//! JobMatch CLI binary entry point.

use clap::Parser;
use jobmatch_client::cli::{auth, request, Cli, Commands};
use reqwest::Method;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = cli.client()?;
    client.on_session_expired(|event| {
        eprintln!("⚠️  Session expired: {}. Run `jobmatch login` again.", event.reason);
    });

    match cli.command {
        Commands::Login(args) => auth::handle_login(&client, args).await,
        Commands::Register(args) => auth::handle_register(&client, args).await,
        Commands::Logout => auth::handle_logout(&client).await,
        Commands::Status => auth::handle_status(&client).await,
        Commands::Get(args) => request::handle_simple(&client, Method::GET, args).await,
        Commands::Delete(args) => request::handle_simple(&client, Method::DELETE, args).await,
        Commands::Post(args) => request::handle_with_body(&client, Method::POST, args).await,
        Commands::Put(args) => request::handle_with_body(&client, Method::PUT, args).await,
        Commands::Upload(args) => request::handle_upload(&client, args).await,
    }
}
