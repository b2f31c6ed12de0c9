//! tasklist-server entry point

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

use tasklist_core::AwsCredentials;
use tasklist_server::{AppState, ServerConfig, init_logging, router};

/// Tasklist API server
#[derive(Parser, Debug)]
#[command(name = "tasklist-server", version, about = "Tasklist API server")]
struct Cli {
    /// Configuration file (.toml, .yaml, .yml or .json)
    #[arg(short, long, env = "TASKLIST_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Listen address, overrides `bind_address`
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        ServerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    init_logging(&config.logging)?;

    let credentials =
        AwsCredentials::from_env().context("Attachment signing credentials unavailable")?;
    let state = AppState::from_config(&config, credentials)?;

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "Tasklist server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Tasklist server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
