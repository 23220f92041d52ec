//! # Synchronizer
//!
//! Pushes a full snapshot to the backup service after committed writes,
//! off the write path.
//!
//! ## Push Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Synchronizer Loop                                │
//! │                                                                         │
//! │  Books::commit ──► watch<Revision> ──┐                                  │
//! │  (never waits on the network)        │                                  │
//! │                                      ▼                                  │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  select! {                                                       │  │
//! │  │    changes.changed() ──► revision = borrow_and_update()          │  │
//! │  │                          export_snapshot(now)   (as of dequeue)  │  │
//! │  │                          client.save(snapshot)  (one in flight)  │  │
//! │  │                          record outcome                          │  │
//! │  │    shutdown_rx.recv() ─► break                                   │  │
//! │  │  }                                                               │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  COALESCING:                                                           │
//! │  • The watch channel holds only the latest revision                    │
//! │  • Writes during a push mark one pending change, not a queue           │
//! │  • A push overtaken by newer writes is counted as superseded           │
//! │  • Failures are logged; the next write triggers the next attempt       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tally_core::SavedBackup;
use tally_db::{Books, Revision};
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info, warn};

use crate::client::BackupClient;
use crate::config::SyncMode;
use crate::error::{SyncError, SyncResult};

// =============================================================================
// Sync Status
// =============================================================================

/// Push history for external queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    /// Push mode.
    pub mode: SyncMode,

    /// Revision carried by the last successful push that was still current
    /// when it completed. A superseded push leaves it alone.
    pub last_pushed_revision: Option<Revision>,

    /// Filename the service assigned to that same push.
    pub last_filename: Option<String>,

    /// When the last successful push completed.
    pub last_success_at: Option<DateTime<Utc>>,

    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,

    /// Successful pushes.
    pub pushes: u64,

    /// Failed pushes (export or upload).
    pub failures: u64,

    /// Pushes that completed after a newer write had already landed.
    pub superseded: u64,
}

// =============================================================================
// Manual Backup
// =============================================================================

/// Exports the books now and uploads the snapshot.
///
/// Unlike the background push, errors are returned to the caller.
pub async fn backup_now(books: &Books, client: &dyn BackupClient) -> SyncResult<SavedBackup> {
    let snapshot = books.export_snapshot(Utc::now()).await?;
    let saved = client.save(&snapshot).await?;

    info!(
        filename = %saved.filename,
        records = snapshot.record_count(),
        "Backup saved"
    );
    Ok(saved)
}

// =============================================================================
// Synchronizer
// =============================================================================

/// Background task pushing snapshots after committed writes.
pub struct Synchronizer {
    books: Arc<Books>,
    client: Arc<dyn BackupClient>,
    mode: SyncMode,
    changes: watch::Receiver<Revision>,
    status: Arc<RwLock<SyncStatus>>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for querying and stopping the synchronizer.
#[derive(Clone)]
pub struct SynchronizerHandle {
    status: Arc<RwLock<SyncStatus>>,
    shutdown_tx: mpsc::Sender<()>,
}

impl SynchronizerHandle {
    /// Returns the current push status.
    pub async fn status(&self) -> SyncStatus {
        self.status.read().await.clone()
    }

    /// Triggers graceful shutdown. An in-flight push completes first.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Shutdown channel closed".into()))
    }
}

impl Synchronizer {
    /// Creates a synchronizer subscribed to `books` and returns its handle.
    ///
    /// Writes committed before this call are not pushed.
    pub fn new(
        books: Arc<Books>,
        client: Arc<dyn BackupClient>,
        mode: SyncMode,
    ) -> (Self, SynchronizerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let status = Arc::new(RwLock::new(SyncStatus {
            mode,
            ..Default::default()
        }));

        let synchronizer = Synchronizer {
            changes: books.subscribe(),
            books,
            client,
            mode,
            status: status.clone(),
            shutdown_rx,
        };

        (synchronizer, SynchronizerHandle { status, shutdown_tx })
    }

    /// Runs the push loop until shutdown or until the books are dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        if !self.mode.is_sync_enabled() {
            info!("Backup sync disabled (mode: offline)");
            self.shutdown_rx.recv().await;
            return;
        }

        info!("Synchronizer starting");

        loop {
            tokio::select! {
                changed = self.changes.changed() => {
                    if changed.is_err() {
                        info!("Books closed, synchronizer stopping");
                        break;
                    }
                    let revision = *self.changes.borrow_and_update();
                    self.push(revision).await;
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Synchronizer shutting down");
                    break;
                }
            }
        }

        info!("Synchronizer stopped");
    }

    /// One push attempt for `revision`. Never propagates failures.
    async fn push(&self, revision: Revision) {
        debug!(revision, "Pushing snapshot");

        let result = backup_now(&self.books, self.client.as_ref()).await;
        let superseded = self.changes.has_changed().unwrap_or(false);

        let mut status = self.status.write().await;
        match result {
            Ok(saved) => {
                status.pushes += 1;
                status.last_success_at = Some(Utc::now());
                status.last_error = None;
                if !superseded {
                    status.last_pushed_revision = Some(revision);
                    status.last_filename = Some(saved.filename);
                }
            }
            Err(e) => {
                warn!(
                    revision,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Backup push failed, local write kept"
                );
                status.failures += 1;
                status.last_error = Some(e.to_string());
            }
        }

        if superseded {
            debug!(revision, "Push superseded by a newer write");
            status.superseded += 1;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
