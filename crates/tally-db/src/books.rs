//! # Books: Single-Writer Gate over the Collection Store
//!
//! Every mutation of the books goes through [`Books::write`], which hands
//! out a [`WriteGuard`] holding the writer lock. The guard reads what the
//! operation needs, and is consumed by exactly one atomic commit.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        One ledger operation                             │
//! │                                                                         │
//! │  books.write().await ──► WriteGuard (writer lock held)                  │
//! │       │                                                                 │
//! │       ├── guard.read(customers)   strict: errors propagate              │
//! │       ├── guard.read(invoices)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute (tally-core), build WriteBatch                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  guard.commit(batch) ──► store.commit (all or nothing)                  │
//! │       │                                                                 │
//! │       ├── Err ──► nothing visible, no event                             │
//! │       └── Ok  ──► revision += 1 ──► watch channel ──► Synchronizer      │
//! │                                                                         │
//! │  lock released                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Read Policy
//! Outside a write, [`Books::read`] degrades: a collection that can't be
//! loaded or decoded is logged and treated as empty. Inside a write, and
//! when exporting a snapshot, reads are strict so a transient failure can
//! never be committed or backed up as an empty collection.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tally_core::{BackupSnapshot, Collection, SNAPSHOT_VERSION};
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::store::{CollectionStore, WriteBatch};

/// Monotonic count of committed writes. Starts at 0.
pub type Revision = u64;

// =============================================================================
// Books
// =============================================================================

/// The writer-gated handle over a `CollectionStore`.
pub struct Books {
    store: Arc<dyn CollectionStore>,
    writer: Mutex<()>,
    changes: watch::Sender<Revision>,
}

impl Books {
    /// Wraps a store. No I/O happens until the first read or write.
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        let (changes, _) = watch::channel(0);
        Books {
            store,
            writer: Mutex::new(()),
            changes,
        }
    }

    /// Subscribes to "collections changed" events.
    ///
    /// The receiver only ever holds the latest revision, so bursts of writes
    /// collapse into one pending notification.
    pub fn subscribe(&self) -> watch::Receiver<Revision> {
        self.changes.subscribe()
    }

    /// Revision of the last committed write.
    pub fn revision(&self) -> Revision {
        *self.changes.borrow()
    }

    /// Mints a new entity id.
    pub fn generate_id(&self) -> String {
        self.store.generate_id()
    }

    /// Reads a collection, treating any failure as an empty collection.
    pub async fn read<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        match self.try_read(collection).await {
            Ok(items) => items,
            Err(e) => {
                warn!(%collection, error = %e, "Collection unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Reads a collection, propagating load and decode failures.
    pub async fn try_read<T: DeserializeOwned>(&self, collection: Collection) -> DbResult<Vec<T>> {
        match self.store.load(collection).await? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| DbError::corrupt(collection, e.to_string())),
        }
    }

    /// Waits for the writer lock.
    pub async fn write(&self) -> WriteGuard<'_> {
        WriteGuard {
            books: self,
            _lock: self.writer.lock().await,
        }
    }

    /// Exports all five collections as of one instant.
    ///
    /// Holds the writer lock while reading so the snapshot never mixes
    /// states from before and after a write.
    pub async fn export_snapshot(&self, timestamp: DateTime<Utc>) -> DbResult<BackupSnapshot> {
        let _lock = self.writer.lock().await;

        Ok(BackupSnapshot {
            cash_entries: self.try_read(Collection::CashEntries).await?,
            customers: self.try_read(Collection::Customers).await?,
            products: self.try_read(Collection::Products).await?,
            purchase_invoices: self.try_read(Collection::PurchaseInvoices).await?,
            menu_items: self.try_read(Collection::MenuItems).await?,
            timestamp,
            version: SNAPSHOT_VERSION.to_string(),
        })
    }

    /// Replaces all five collections with the snapshot's content.
    ///
    /// One batch, one commit: either every collection is replaced or none
    /// is. No other write runs until the swap is done.
    pub async fn restore(&self, snapshot: &BackupSnapshot) -> DbResult<Revision> {
        let guard = self.write().await;

        let mut batch = WriteBatch::new();
        batch
            .put(Collection::CashEntries, &snapshot.cash_entries)?
            .put(Collection::Customers, &snapshot.customers)?
            .put(Collection::Products, &snapshot.products)?
            .put(Collection::PurchaseInvoices, &snapshot.purchase_invoices)?
            .put(Collection::MenuItems, &snapshot.menu_items)?;

        let revision = guard.commit(batch).await?;
        info!(
            revision,
            records = snapshot.record_count(),
            taken_at = %snapshot.timestamp,
            "Books restored from snapshot"
        );
        Ok(revision)
    }

    fn publish(&self) -> Revision {
        self.changes.send_modify(|revision| *revision += 1);
        self.revision()
    }
}

// =============================================================================
// Write Guard
// =============================================================================

/// Exclusive access to the books for one read-compute-commit cycle.
pub struct WriteGuard<'a> {
    books: &'a Books,
    _lock: MutexGuard<'a, ()>,
}

impl WriteGuard<'_> {
    /// Strict read inside the critical section.
    pub async fn read<T: DeserializeOwned>(&self, collection: Collection) -> DbResult<Vec<T>> {
        self.books.try_read(collection).await
    }

    /// Mints a new entity id.
    pub fn generate_id(&self) -> String {
        self.books.generate_id()
    }

    /// Commits the batch and publishes a change event.
    ///
    /// Consumes the guard: one operation, one commit.
    pub async fn commit(self, batch: WriteBatch) -> DbResult<Revision> {
        let collections: Vec<Collection> = batch.collections().collect();
        self.books.store.commit(batch).await?;

        let revision = self.books.publish();
        debug!(revision, ?collections, "Write committed");
        Ok(revision)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
