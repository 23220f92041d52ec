//! # tally-db: Local Store & Ledger Service for Tally Books
//!
//! Persistence for the five collections and the service that keeps their
//! derived values consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Books Data Flow                            │
//! │                                                                         │
//! │  caller (record_invoice, delete_invoice, ...)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ LedgerService │───►│     Books     │───►│ Collection-  │  │   │
//! │  │   │  (ledger.rs)  │    │  (books.rs)   │    │ Store (port) │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ validate      │    │ writer lock   │    │ MemoryStore  │  │   │
//! │  │   │ compute       │    │ one batch     │    │ Database     │  │   │
//! │  │   │ build batch   │    │ change event ─┼─┐  │ (SQLite)     │  │   │
//! │  │   └───────────────┘    └───────────────┘ │  └──────────────┘  │   │
//! │  └──────────────────────────────────────────┼──────────────────────┘   │
//! │                                             ▼                          │
//! │                              tally-sync Synchronizer (watch channel)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - The `CollectionStore` port and `WriteBatch`
//! - [`memory`] - In-memory store (tests, ephemeral sessions)
//! - [`pool`] - SQLite store (`Database`, `DbConfig`)
//! - [`migrations`] - Embedded database migrations
//! - [`books`] - Single-writer gate, change events, snapshot export/restore
//! - [`ledger`] - `LedgerService` operations
//! - [`error`] - Storage and ledger error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_db::{Books, Database, DbConfig, LedgerService};
//!
//! let db = Database::new(DbConfig::new("./data/tally.db")).await?;
//! let books = Arc::new(Books::new(Arc::new(db)));
//! let ledger = LedgerService::new(books.clone());
//!
//! let customer = ledger.create_customer(new_customer).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod books;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use books::{Books, Revision, WriteGuard};
pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::{LedgerService, Overview};
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};
pub use store::{CollectionStore, WriteBatch};
