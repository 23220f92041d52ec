//! # Restore
//!
//! Replaces the local books with a snapshot from the backup service.
//!
//! ## Restore Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  client.latest() / client.get(name)                                    │
//! │       │  typed decode: five collections + timestamp + version          │
//! │       ▼                                                                 │
//! │  version check ("1.0")                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Books::restore ──► writer lock ──► one batch of five ──► commit       │
//! │                                                                         │
//! │  Any failure before the commit leaves the books exactly as they were.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A successful restore is itself a committed write, so a running
//! synchronizer pushes the restored state as a new snapshot.

use chrono::{DateTime, Utc};
use tally_core::BackupSnapshot;
use tally_db::{Books, Revision};
use tracing::{info, warn};

use crate::client::BackupClient;
use crate::error::{SyncError, SyncResult};

/// What a restore did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The books now hold the snapshot's content.
    Restored {
        revision: Revision,
        taken_at: DateTime<Utc>,
        records: usize,
    },

    /// The service has no snapshots yet. Nothing changed.
    NoBackups,
}

/// Restores the newest snapshot.
pub async fn restore_latest(
    client: &dyn BackupClient,
    books: &Books,
) -> SyncResult<RestoreOutcome> {
    match client.latest().await? {
        Some(snapshot) => apply_snapshot(books, &snapshot).await,
        None => {
            info!("No backups available to restore");
            Ok(RestoreOutcome::NoBackups)
        }
    }
}

/// Restores the snapshot stored under `filename`.
pub async fn restore_named(
    client: &dyn BackupClient,
    books: &Books,
    filename: &str,
) -> SyncResult<RestoreOutcome> {
    let snapshot = client.get(filename).await?;
    info!(filename, "Restoring named backup");
    apply_snapshot(books, &snapshot).await
}

/// Checks the snapshot version and swaps all five collections in.
pub async fn apply_snapshot(
    books: &Books,
    snapshot: &BackupSnapshot,
) -> SyncResult<RestoreOutcome> {
    if !snapshot.is_supported_version() {
        warn!(version = %snapshot.version, "Refusing to restore snapshot");
        return Err(SyncError::UnsupportedVersion(snapshot.version.clone()));
    }

    let revision = books.restore(snapshot).await?;

    Ok(RestoreOutcome::Restored {
        revision,
        taken_at: snapshot.timestamp,
        records: snapshot.record_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::{Arc, Mutex};
    use tally_core::{
        BackupInfo, Money, NewCashEntry, NewCustomer, NewProduct, PaymentType, SavedBackup,
        TransactionType,
    };
    use tally_db::{LedgerService, MemoryStore};

    /// Keeps saved snapshots in memory, newest last.
    #[derive(Default)]
    struct InMemoryBackups {
        saved: Mutex<Vec<(String, BackupSnapshot)>>,
    }

    #[async_trait]
    impl BackupClient for InMemoryBackups {
        async fn save(&self, snapshot: &BackupSnapshot) -> SyncResult<SavedBackup> {
            let mut saved = self.saved.lock().unwrap();
            let filename = format!("backup_{}.json", saved.len());
            saved.push((filename.clone(), snapshot.clone()));
            Ok(SavedBackup { filename })
        }

        async fn list(&self) -> SyncResult<Vec<BackupInfo>> {
            Ok(Vec::new())
        }

        async fn latest(&self) -> SyncResult<Option<BackupSnapshot>> {
            Ok(self.saved.lock().unwrap().last().map(|(_, s)| s.clone()))
        }

        async fn get(&self, filename: &str) -> SyncResult<BackupSnapshot> {
            self.saved
                .lock()
                .unwrap()
                .iter()
                .find(|(name, _)| name == filename)
                .map(|(_, s)| s.clone())
                .ok_or_else(|| SyncError::Remote("Backup not found".into()))
        }
    }

    fn ledger() -> LedgerService {
        LedgerService::new(Arc::new(Books::new(Arc::new(MemoryStore::new()))))
    }

    async fn populate(ledger: &LedgerService) {
        let customer = ledger
            .create_customer(NewCustomer {
                title: "Acme Foods".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        ledger
            .create_product(NewProduct {
                name: "Sugar".into(),
                current_price: Money::new(Decimal::new(1250, 2)),
                ..Default::default()
            })
            .await
            .unwrap();
        ledger
            .record_cash_entry(NewCashEntry {
                date: None,
                amount: Some(Money::new(Decimal::from(40))),
                payment_type: PaymentType::Cash,
                description: "supplier payment".into(),
                transaction_type: TransactionType::Expense,
                customer_id: Some(customer.id),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_restore_fidelity() {
        let ledger = ledger();
        let backups = InMemoryBackups::default();
        populate(&ledger).await;

        let saved = crate::synchronizer::backup_now(ledger.books(), &backups).await.unwrap();
        let snapshot = backups.get(&saved.filename).await.unwrap();

        // Diverge after the backup.
        ledger
            .create_customer(NewCustomer {
                title: "Late Arrival".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let outcome = restore_latest(&backups, ledger.books()).await.unwrap();
        assert!(matches!(outcome, RestoreOutcome::Restored { records: 3, .. }));

        let restored = ledger.books().export_snapshot(snapshot.timestamp).await.unwrap();
        assert_eq!(restored, snapshot);
    }

    #[tokio::test]
    async fn test_restore_named() {
        let ledger = ledger();
        let backups = InMemoryBackups::default();

        let empty = crate::synchronizer::backup_now(ledger.books(), &backups).await.unwrap();
        populate(&ledger).await;
        crate::synchronizer::backup_now(ledger.books(), &backups).await.unwrap();

        restore_named(&backups, ledger.books(), &empty.filename).await.unwrap();
        assert!(ledger.customers().await.is_empty());

        let missing = restore_named(&backups, ledger.books(), "backup_missing.json").await;
        assert!(matches!(missing, Err(SyncError::Remote(_))));
    }

    #[tokio::test]
    async fn test_no_backups_is_not_an_error() {
        let ledger = ledger();
        populate(&ledger).await;
        let revision = ledger.books().revision();

        let outcome = restore_latest(&InMemoryBackups::default(), ledger.books()).await.unwrap();
        assert_eq!(outcome, RestoreOutcome::NoBackups);
        assert_eq!(ledger.books().revision(), revision);
        assert_eq!(ledger.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_version_leaves_books_untouched() {
        let ledger = ledger();
        populate(&ledger).await;
        let before = ledger.books().export_snapshot(Utc::now()).await.unwrap();

        let mut future = BackupSnapshot::empty(Utc::now());
        future.version = "2.0".into();

        let err = apply_snapshot(ledger.books(), &future).await.unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedVersion(v) if v == "2.0"));

        let after = ledger.books().export_snapshot(before.timestamp).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_storage_failure_applies_nothing() {
        let store = Arc::new(MemoryStore::new());
        let ledger = LedgerService::new(Arc::new(Books::new(store.clone())));
        populate(&ledger).await;
        let before = ledger.books().export_snapshot(Utc::now()).await.unwrap();

        store.set_fail_writes(true);
        let err = apply_snapshot(ledger.books(), &BackupSnapshot::empty(Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));
        store.set_fail_writes(false);

        let after = ledger.books().export_snapshot(before.timestamp).await.unwrap();
        assert_eq!(after, before);
    }
}
