//! # Tally Backup Server
//!
//! HTTP service that keeps full-state snapshots of Tally Books.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Backup Server                                    │
//! │                                                                         │
//! │  Tally Books ───► HTTP/JSON (3001) ───► Routes ───► BackupStore        │
//! │  (tally-sync)                                           │               │
//! │                                                         ▼               │
//! │                                              DATA_DIR/backup_<ts>.json  │
//! │                                              (newest MAX_BACKUPS kept)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `PORT` - HTTP port (default: 3001)
//! - `BIND_ADDR` - Interface to bind (default: 0.0.0.0)
//! - `DATA_DIR` - Backup directory (default: ./data)
//! - `MAX_BACKUPS` - Backups kept (default: 50)
//! - `BODY_LIMIT_BYTES` - Largest accepted snapshot (default: 50MB)
//! - `RUST_LOG` - Log filter (default: info)

pub mod config;
pub mod error;
pub mod routes;
pub mod store;

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

// Re-exports
pub use config::{ConfigError, ServerConfig};
pub use error::{BackupError, BackupResult};
pub use routes::router;
pub use store::BackupStore;

/// Serves the backup API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    store: Arc<BackupStore>,
    body_limit: usize,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(store, body_limit))
        .with_graceful_shutdown(shutdown)
        .await
}
