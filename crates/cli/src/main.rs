//! vk-auth - obtain VK access tokens without a browser
//!
//! Logs go to stderr; stdout carries only the JSON result.

mod args;
mod commands;
mod prompt;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Login(login) => commands::login(login).await,
        Command::Scope { spec, groups } => commands::scope(&spec, groups),
        Command::Permissions { groups } => commands::permissions(groups),
        Command::Verify { token, api_url } => commands::verify(&token, api_url).await,
    }
}
