//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Missing entities, wrapped validation           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  ├── DbError          - Storage read/write failures                    │
//! │  └── LedgerError      - CoreError | DbError, per ledger operation      │
//! │                                                                         │
//! │  tally-sync errors                                                     │
//! │  └── SyncError        - Backup transport and restore failures          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// A failed operation that returns one of these has written nothing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Customer cannot be found.
    ///
    /// ## When This Occurs
    /// - Recording an invoice for a customer id that isn't in the books
    /// - Recording an expense payment against an unknown customer
    /// - Requesting a statement for an unknown customer
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Invoice cannot be found.
    ///
    /// ## When This Occurs
    /// - Deleting an invoice twice
    /// - Deleting by an id from a stale view after a restore
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Menu item cannot be found.
    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for the "entity does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::CustomerNotFound(_)
                | CoreError::InvoiceNotFound(_)
                | CoreError::MenuItemNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state is read or written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is too large to compute with exactly.
    ///
    /// ## When This Occurs
    /// - An invoice line whose quantity × unit price exceeds the decimal range
    /// - A payment or invoice that would push a balance past the decimal range
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Invalid format (e.g., a date range with start after end).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvoiceNotFound("inv-9".to_string());
        assert_eq!(err.to_string(), "Invoice not found: inv-9");

        let err = ValidationError::OutOfRange {
            field: "discountRate".to_string(),
            min: 0,
            max: 100,
        };
        assert_eq!(err.to_string(), "discountRate must be between 0 and 100");

        let err = ValidationError::TooLarge {
            field: "unitPrice".to_string(),
        };
        assert_eq!(err.to_string(), "unitPrice is too large");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customerId".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
    }

    #[test]
    fn test_not_found_family() {
        assert!(CoreError::CustomerNotFound("c".into()).is_not_found());
        assert!(CoreError::MenuItemNotFound("m".into()).is_not_found());
    }
}
