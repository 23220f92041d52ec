//! # Storage & Ledger Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / serde_json::Error                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds collection context                       │
//! │       │                                                                 │
//! │       ├── reads:  logged, collection treated as empty                  │
//! │       └── writes: propagated                                           │
//! │                     │                                                   │
//! │  CoreError ─────────┤                                                   │
//! │                     ▼                                                   │
//! │               LedgerError ← What every LedgerService call returns      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_core::{Collection, CoreError, ValidationError};
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A collection could not be loaded.
    ///
    /// ## When This Occurs
    /// - The store is unreachable (pool closed, file permissions)
    /// - Fault injection in `MemoryStore`
    #[error("Failed to read {collection}: {reason}")]
    ReadFailed {
        collection: Collection,
        reason: String,
    },

    /// A collection was loaded but is not valid JSON for its type.
    #[error("Collection {collection} is corrupt: {reason}")]
    Corrupt {
        collection: Collection,
        reason: String,
    },

    /// A write batch was not committed. Nothing from the batch is visible.
    ///
    /// ## When This Occurs
    /// - Disk full, database locked
    /// - Transaction rolled back
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A value could not be serialized for storage.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Internal store error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a ReadFailed error for a collection.
    pub fn read_failed(collection: Collection, reason: impl Into<String>) -> Self {
        DbError::ReadFailed {
            collection,
            reason: reason.into(),
        }
    }

    /// Creates a Corrupt error for a collection.
    pub fn corrupt(collection: Collection, reason: impl Into<String>) -> Self {
        DbError::Corrupt {
            collection,
            reason: reason.into(),
        }
    }

    /// True for errors raised while loading a collection.
    pub fn is_read_error(&self) -> bool {
        matches!(self, DbError::ReadFailed { .. } | DbError::Corrupt { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Ledger Error
// =============================================================================

/// Error returned by every `LedgerService` operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Business rule failure (validation, missing entity).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store refused the write.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(CoreError::Validation(err))
    }
}

impl LedgerError {
    /// True for input validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Core(CoreError::Validation(_)))
    }

    /// True when a referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::Core(e) if e.is_not_found())
    }

    /// True when the store failed.
    pub fn is_storage(&self) -> bool {
        matches!(self, LedgerError::Storage(_))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err: LedgerError = ValidationError::Required {
            field: "items".into(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());

        let err: LedgerError = CoreError::InvoiceNotFound("i1".into()).into();
        assert!(err.is_not_found());

        let err: LedgerError = DbError::WriteFailed("disk full".into()).into();
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "Write failed: disk full");
    }

    #[test]
    fn test_read_error_context() {
        let err = DbError::corrupt(Collection::Customers, "expected array");
        assert!(err.is_read_error());
        assert_eq!(err.to_string(), "Collection customers is corrupt: expected array");
    }
}
