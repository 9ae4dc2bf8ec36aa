//! nmrl-gateway - Main entry point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nmrl_common::config::{load_section, locate_config_file};
use nmrl_gateway::config::{GatewayConfig, GatewaySettings};
use nmrl_gateway::{build_router, AppState};

/// Command-line arguments for nmrl-gateway
#[derive(Parser, Debug)]
#[command(name = "nmrl-gateway")]
#[command(about = "GitHub gateway for the NMRlipids upload portal")]
#[command(version)]
struct Args {
    /// Config file (TOML, `[gateway]` section)
    #[arg(short, long, env = "NMRL_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    settings: GatewaySettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nmrl_gateway=info,nmrl_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_file = locate_config_file(args.config.as_deref())
        .context("Failed to locate config file")?;
    match &config_file {
        Some(path) => info!("Using config file {}", path.display()),
        None => warn!("No config file found; using command line and environment only"),
    }
    let file_settings: GatewaySettings = load_section(config_file.as_deref(), "gateway")
        .context("Failed to read [gateway] config section")?;
    let config = GatewayConfig::resolve(args.settings, file_settings)
        .context("Invalid gateway configuration")?;

    info!(
        "Work repository {}, pull requests to {} ({})",
        config.work_repo, config.target_repo, config.base_branch
    );
    info!("Databank API at {}", config.databank_url);

    let addr = config.bind;
    let state = AppState::new(config).context("Failed to initialize gateway")?;
    let app = build_router(state);

    info!("Starting NMRL gateway on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
