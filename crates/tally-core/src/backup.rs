//! # Backup Snapshot & Wire Envelope
//!
//! The payload exchanged with the backup service and the JSON envelope
//! every endpoint answers with.
//!
//! ## Snapshot Shape
//! ```text
//! {
//!   "cash_entries":      [CashEntry...],
//!   "customers":         [Customer...],
//!   "products":          [Product...],
//!   "purchase_invoices": [PurchaseInvoice...],
//!   "menu_items":        [MenuItem...],
//!   "timestamp":         "2024-03-01T10:00:00.000Z",
//!   "version":           "1.0"
//! }
//! ```
//!
//! Top-level keys are snake_case, entities inside are camelCase. All seven
//! fields are required: a body missing one is not a snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CashEntry, Customer, MenuItem, Product, PurchaseInvoice};

/// Snapshot format written by this version.
pub const SNAPSHOT_VERSION: &str = "1.0";

// =============================================================================
// Snapshot
// =============================================================================

/// A complete export of all five collections at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub cash_entries: Vec<CashEntry>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub purchase_invoices: Vec<PurchaseInvoice>,
    pub menu_items: Vec<MenuItem>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl BackupSnapshot {
    /// An empty snapshot stamped with `timestamp`.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        BackupSnapshot {
            cash_entries: Vec::new(),
            customers: Vec::new(),
            products: Vec::new(),
            purchase_invoices: Vec::new(),
            menu_items: Vec::new(),
            timestamp,
            version: SNAPSHOT_VERSION.to_string(),
        }
    }

    /// True if this build knows how to restore the snapshot.
    pub fn is_supported_version(&self) -> bool {
        self.version == SNAPSHOT_VERSION
    }

    /// Number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.cash_entries.len()
            + self.customers.len()
            + self.products.len()
            + self.purchase_invoices.len()
            + self.menu_items.len()
    }
}

// =============================================================================
// Wire Envelope
// =============================================================================

/// `{success, data?, error?}` returned by every backup endpoint.
///
/// `data` is omitted when absent, so `latest` on an empty store answers
/// `{"success": true}` and clients read it as "no backups yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Successful response with nothing to return.
    pub fn empty() -> Self {
        ApiResponse {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Failed response carrying a message.
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Identity assigned to a saved snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedBackup {
    pub filename: String,
}

/// Listing entry: the identity and the date string derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupInfo {
    pub filename: String,
    pub date: String,
}
