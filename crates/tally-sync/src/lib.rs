//! # tally-sync: Backup Sync Engine for Tally Books
//!
//! Makes the local books recoverable. Every committed write is followed by
//! a full snapshot pushed to the backup service in the background, and any
//! retained snapshot can be restored atomically.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Backup Sync Architecture                         │
//! │                                                                         │
//! │  LedgerService ──► Books::commit ──► watch<Revision>                    │
//! │                                           │                             │
//! │                                           ▼                             │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 Synchronizer (spawned Tokio task)                │  │
//! │  │                                                                  │  │
//! │  │  Coalesces bursts, one push in flight, failures logged only      │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  ┌────────────────┐    ┌────────────────┐    ┌────────────────────┐    │
//! │  │ BackupClient   │───►│ backup-server  │◄───│ restore_latest /   │    │
//! │  │ (HTTP/JSON)    │    │ /api/backup... │    │ restore_named      │    │
//! │  └────────────────┘    └────────────────┘    └────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - `BackupClient` port and its HTTP implementation
//! - [`config`] - Sync configuration (backup URL, mode, timeout)
//! - [`error`] - Sync error types
//! - [`restore`] - Snapshot restore into the local books
//! - [`synchronizer`] - Background push loop and manual backup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_sync::{HttpBackupClient, SyncConfig, Synchronizer};
//!
//! let config = SyncConfig::load_or_default(None);
//! let client = Arc::new(HttpBackupClient::new(&config)?);
//!
//! let (synchronizer, handle) = Synchronizer::new(books.clone(), client, config.mode());
//! tokio::spawn(synchronizer.run());
//!
//! // ... later
//! let status = handle.status().await;
//! println!("Pushed: {} Failed: {}", status.pushes, status.failures);
//! handle.shutdown().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod restore;
pub mod synchronizer;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{BackupClient, HttpBackupClient};
pub use config::{BackupSettings, SyncConfig, SyncMode};
pub use error::{SyncError, SyncResult};
pub use restore::{apply_snapshot, restore_latest, restore_named, RestoreOutcome};
pub use synchronizer::{backup_now, SyncStatus, Synchronizer, SynchronizerHandle};
