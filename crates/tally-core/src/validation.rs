//! # Validation Module
//!
//! Input validation for drafts submitted to the ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  └── Shape and types of the draft                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, positive amounts                                 │
//! │  └── Percentages within 0..=100                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: LedgerService                                                │
//! │  └── Referenced customer exists, invoice exists                        │
//! │                                                                         │
//! │  Nothing is read or written until layers 1 and 2 pass.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text field and returns it trimmed.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_required;
///
/// assert_eq!(validate_required("title", "  Acme  ").unwrap(), "Acme");
/// assert!(validate_required("title", "   ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(value.to_string())
}

/// Validates an optional reference id (e.g. `customerId`).
///
/// Blank strings count as absent.
pub fn require_id(field: &str, value: Option<&str>) -> ValidationResult<String> {
    match value.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ValidationError::Required {
            field: field.to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a monetary amount that must be present and greater than zero.
pub fn validate_amount(field: &str, amount: Option<Money>) -> ValidationResult<Money> {
    let amount = amount.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })?;

    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(amount)
}

/// Validates a quantity (> 0).
pub fn validate_quantity(field: &str, quantity: Decimal) -> ValidationResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a price (≥ 0).
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a percentage in `0..=100`.
pub fn validate_percentage(field: &str, rate: Decimal) -> ValidationResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "Flour").is_ok());
        assert!(matches!(
            validate_required("name", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_required("name", &"x".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
    }

    #[test]
    fn test_require_id() {
        assert_eq!(require_id("customerId", Some(" c1 ")).unwrap(), "c1");
        assert!(require_id("customerId", Some("")).is_err());
        assert!(require_id("customerId", None).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("amount", Some(Money::new(dec!(0.01)))).is_ok());
        assert!(matches!(
            validate_amount("amount", None),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_amount("amount", Some(Money::zero())),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_amount("amount", Some(Money::new(dec!(-3)))).is_err());
    }

    #[test]
    fn test_numeric_rules() {
        assert!(validate_quantity("quantity", dec!(0.5)).is_ok());
        assert!(validate_quantity("quantity", dec!(0)).is_err());
        assert!(validate_price("unitPrice", Money::zero()).is_ok());
        assert!(validate_price("unitPrice", Money::new(dec!(-1))).is_err());
        assert!(validate_percentage("discountRate", dec!(100)).is_ok());
        assert!(validate_percentage("discountRate", dec!(100.01)).is_err());
        assert!(validate_percentage("discountRate", dec!(-1)).is_err());
    }
}
