//! Beacon - PWA host with push notification relay

use anyhow::Context;
use beacon_core::{init_logging, AppConfig, LogConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log = LogConfig::from_env().context("Invalid logging configuration")?;
    init_logging(&log);

    info!("Starting Beacon...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    if config.push.credentials().is_none() {
        warn!("OneSignal credentials not configured; send routes will return 500");
    }
    info!(
        static_dir = %config.server.static_dir.display(),
        cache = %config.worker.cache_name,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    beacon_server::serve(&config, listener, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Beacon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
