use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use unity_docs_index::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(code) => tracing::info!(?code, "CLI completed"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
