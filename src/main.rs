// ABOUTME: Entry point for the bootgate binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and starts the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bootgate_core::is_configured;
use bootgate_server::config::parse_bind;
use bootgate_server::{AppState, ServerConfig, SetupGate, create_router};
use bootgate_store::StateLayout;
use clap::Parser;

/// First-boot setup gate for a credentialed gateway
#[derive(Parser)]
#[command(name = "bootgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on (overrides BOOTGATE_BIND)
    #[arg(long)]
    bind: Option<String>,

    /// State directory holding config, credentials and agent sessions (overrides BOOTGATE_STATE_DIR)
    #[arg(long)]
    state_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bootgate=debug,tower_http=debug")),
        )
        .init();

    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind = parse_bind(&bind)?;
    }
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = state_dir;
    }
    tracing::info!(?config, "bootgate starting up");

    let layout = StateLayout::new(config.state_dir.clone());
    layout
        .ensure()
        .with_context(|| format!("create state dir {}", layout.root().display()))?;
    let snapshot = layout
        .config_file()
        .load()
        .context("load gateway configuration")?;

    let configured = is_configured(&snapshot);
    config.check_exposure(configured)?;
    if !configured && config.setup_password.is_none() {
        tracing::warn!("setup wizard is open to anyone who can reach it; set SETUP_PASSWORD to protect it");
    }

    let gate = SetupGate::new(config.setup_password.clone());
    let state = Arc::new(AppState::new(layout, snapshot, gate).with_restart_delay(config.restart_delay));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, configured, "bootgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
