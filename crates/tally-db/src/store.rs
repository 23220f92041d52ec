//! # Collection Store Port
//!
//! The persistence seam: load a whole collection, commit a batch of whole
//! collections atomically, mint identifiers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CollectionStore implementations                      │
//! │                                                                         │
//! │   MemoryStore (memory.rs)           Database (pool.rs)                  │
//! │   ─────────────────────────         ─────────────────────────           │
//! │   HashMap behind one lock           SQLite `collections` table          │
//! │   batch applied under the lock      batch applied in one transaction    │
//! │   write/read fault injection        WAL, embedded migrations            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stores deal in raw JSON text. Typed decoding lives in [`crate::books`],
//! where decode failures are handled by the read policy.

use async_trait::async_trait;
use serde::Serialize;
use tally_core::Collection;
use uuid::Uuid;

use crate::error::DbResult;

// =============================================================================
// Port
// =============================================================================

/// Key-addressed storage of the five collections.
///
/// ## Contract
/// - `load` returns `None` for a collection that was never written.
/// - `commit` applies every write in the batch or none of them.
/// - Implementations hold no ledger rules and never talk to the network.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Loads the raw JSON array stored under `collection`.
    async fn load(&self, collection: Collection) -> DbResult<Option<String>>;

    /// Commits all writes in `batch` atomically.
    async fn commit(&self, batch: WriteBatch) -> DbResult<()>;

    /// Mints a new unique identifier.
    ///
    /// UUID v4: unique without coordination, never reused.
    fn generate_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

// =============================================================================
// Write Batch
// =============================================================================

/// Whole-collection replacements committed together.
///
/// Putting the same collection twice keeps only the last value.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<(Collection, String)>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `items` as the new content of `collection`.
    pub fn put<T: Serialize>(&mut self, collection: Collection, items: &[T]) -> DbResult<&mut Self> {
        let raw = serde_json::to_string(items)?;
        self.put_raw(collection, raw);
        Ok(self)
    }

    /// Stages already-encoded JSON for `collection`.
    pub fn put_raw(&mut self, collection: Collection, raw: String) -> &mut Self {
        match self.writes.iter_mut().find(|(c, _)| *c == collection) {
            Some(slot) => slot.1 = raw,
            None => self.writes.push((collection, raw)),
        }
        self
    }

    /// Number of staged collections.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Collections touched by this batch, in staging order.
    pub fn collections(&self) -> impl Iterator<Item = Collection> + '_ {
        self.writes.iter().map(|(c, _)| *c)
    }

    /// Consumes the batch.
    pub fn into_writes(self) -> Vec<(Collection, String)> {
        self.writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_put_wins() {
        let mut batch = WriteBatch::new();
        batch.put(Collection::Customers, &[1, 2]).unwrap();
        batch.put(Collection::Products, &[3]).unwrap();
        batch.put(Collection::Customers, &[4]).unwrap();

        assert_eq!(batch.len(), 2);
        let writes = batch.into_writes();
        assert_eq!(writes[0], (Collection::Customers, "[4]".to_string()));
        assert_eq!(writes[1], (Collection::Products, "[3]".to_string()));
    }
}
