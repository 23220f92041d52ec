//! In-memory `CollectionStore`.
//!
//! Backs tests and throwaway sessions. Read and write failures can be
//! switched on to exercise the ledger's error paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tally_core::Collection;

use crate::error::{DbError, DbResult};
use crate::store::{CollectionStore, WriteBatch};

/// Collections held in a `HashMap` behind one lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<Collection, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    commits: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `load` fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `commit` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Overwrites a collection with arbitrary text, bypassing the batch path.
    pub fn insert_raw(&self, collection: Collection, raw: impl Into<String>) -> DbResult<()> {
        self.lock()?.insert(collection, raw.into());
        Ok(())
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, HashMap<Collection, String>>> {
        self.data
            .lock()
            .map_err(|_| DbError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load(&self, collection: Collection) -> DbResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DbError::read_failed(collection, "injected read failure"));
        }
        Ok(self.lock()?.get(&collection).cloned())
    }

    async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbError::WriteFailed("injected write failure".to_string()));
        }

        let mut data = self.lock()?;
        for (collection, raw) in batch.into_writes() {
            data.insert(collection, raw);
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
