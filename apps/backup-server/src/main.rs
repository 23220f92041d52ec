//! # Tally Backup Server
//!
//! Stores full-state snapshots pushed by Tally Books clients.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Backup Server                                    │
//! │                                                                         │
//! │  Tally Books ───► HTTP (3001) ───► Routes ───► DATA_DIR/*.json          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tally_backup_server::{serve, BackupStore, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(true)
        .init();

    info!("Starting Tally backup server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        max_backups = config.max_backups,
        "Configuration loaded"
    );

    // Open the backup directory (applies retention once)
    let store = BackupStore::open(&config.data_dir, config.max_backups)
        .await
        .with_context(|| format!("opening backup directory {}", config.data_dir.display()))?;

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Backup server listening");

    serve(listener, Arc::new(store), config.body_limit_bytes, shutdown_signal()).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
