//! # tally-core: Pure Ledger Logic for Tally Books
//!
//! The arithmetic and data model behind the books: invoices, cash entries,
//! customer balances, statements and menu costing. Everything here is a pure
//! function over plain values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tally Books Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  ledger   │  │ validation│  │   │
//! │  │   │ Customer  │  │   Money   │  │ invoices  │  │   rules   │  │   │
//! │  │   │ Invoice   │  │ (Decimal) │  │statements │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                      ┌───────────┐                             │   │
//! │  │                      │  backup   │  snapshot + wire envelope   │   │
//! │  │                      └───────────┘                             │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tally-db (Collections store + LedgerService)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ change events                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          tally-sync (Synchronizer ──► backup-server)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (CashEntry, Customer, Product, PurchaseInvoice, MenuItem)
//! - [`money`] - Money type over exact decimals (no floating point!)
//! - [`ledger`] - Invoice math, statements, cash balances, menu costing
//! - [`backup`] - Snapshot payload and the backup wire envelope
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tally_core::ledger::compute_line;
//! use tally_core::Money;
//!
//! // 10 × 5.00, 10% discount, 20% VAT
//! let line = compute_line(
//!     Decimal::from(10),
//!     Money::from(Decimal::from(5)),
//!     Decimal::from(10),
//!     Decimal::from(20),
//! )
//! .unwrap();
//! assert_eq!(line.total, Money::from(Decimal::from(54)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use backup::{ApiResponse, BackupInfo, BackupSnapshot, SavedBackup, SNAPSHOT_VERSION};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Unit assigned to products created without one ("piece").
pub const DEFAULT_PRODUCT_UNIT: &str = "adet";

/// VAT rate (percent) assigned to products and invoice lines without one.
pub const DEFAULT_VAT_RATE: i64 = 20;

/// Upper bound for free-text names and titles.
pub const MAX_NAME_LENGTH: usize = 200;
