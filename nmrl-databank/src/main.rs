//! nmrl-databank - Main entry point

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nmrl_common::config::{load_section, locate_config_file};
use nmrl_databank::config::{DatabankConfig, DatabankSettings};
use nmrl_databank::{build_router, AppState};

/// Command-line arguments for nmrl-databank
#[derive(Parser, Debug)]
#[command(name = "nmrl-databank")]
#[command(about = "Databank API for the NMRlipids upload portal")]
#[command(version)]
struct Args {
    /// Config file (TOML, `[databank]` section)
    #[arg(short, long, env = "NMRL_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    settings: DatabankSettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nmrl_databank=info,nmrl_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config_file = locate_config_file(args.config.as_deref())
        .context("Failed to locate config file")?;
    if let Some(path) = &config_file {
        info!("Using config file {}", path.display());
    }
    let file_settings: DatabankSettings = load_section(config_file.as_deref(), "databank")
        .context("Failed to read [databank] config section")?;
    let config = DatabankConfig::resolve(args.settings, file_settings)
        .context("Invalid databank configuration")?;

    info!("BilayerData: {}", config.bilayerdata_path.display());
    info!("Databank: {}", config.databank_path.display());
    info!("Molecules: {}", config.molecule_root.display());
    info!("Static cache: {}", config.static_dir.display());

    let state = AppState::from_config(&config).context("Failed to initialize databank API")?;
    state
        .refresher
        .startup()
        .await
        .context("Failed to prepare static directory")?;

    let periodic = config.refresh_interval.map(|period| {
        info!("Refreshing every {}s", period.as_secs());
        state.refresher.spawn_periodic(period)
    });

    let app = build_router(state);

    info!("Starting NMRL databank API on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(task) = periodic {
        task.abort();
    }
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
