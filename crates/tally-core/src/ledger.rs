//! # Ledger Arithmetic
//!
//! Pure computations behind the books. Nothing here reads a clock or touches
//! storage; `tally_db::ledger::LedgerService` feeds these functions the
//! current collections and persists what they return.
//!
//! ## Balance Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customer.balance = Σ invoice.total          (invoices for customer)    │
//! │                   − Σ entry.amount           (expenses paying customer) │
//! │                                                                         │
//! │  record invoice ──► balance += total     delete invoice ──► -= total   │
//! │  expense payment ─► balance -= amount    income ──────────► unchanged  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invoice Line
//! ```text
//!   line_total     = quantity × unit_price
//!   discount       = line_total × discount_rate / 100
//!   after_discount = line_total − discount
//!   vat            = after_discount × vat_rate / 100
//!   total          = after_discount + vat
//! ```

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    CashEntry, Customer, MenuIngredient, PaymentType, Product, PurchaseInvoice,
    PurchaseInvoiceItem, TransactionType,
};

// =============================================================================
// Invoice Arithmetic
// =============================================================================

/// Every intermediate value of one invoice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineBreakdown {
    pub line_total: Money,
    pub discount: Money,
    pub after_discount: Money,
    pub vat: Money,
    pub total: Money,
}

/// Prices one invoice line.
///
/// VAT rates outside the usual {0, 1, 10, 20} are computed as given.
///
/// ## Errors
/// [`ValidationError::TooLarge`] when any intermediate value leaves the
/// decimal range. Nothing is rounded to make it fit.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tally_core::ledger::compute_line;
/// use tally_core::Money;
///
/// let line = compute_line(
///     Decimal::from(10),
///     Money::from(Decimal::from(5)),
///     Decimal::from(10),
///     Decimal::from(20),
/// )
/// .unwrap();
/// assert_eq!(line.after_discount, Money::from(Decimal::from(45)));
/// assert_eq!(line.vat, Money::from(Decimal::from(9)));
/// ```
pub fn compute_line(
    quantity: Decimal,
    unit_price: Money,
    discount_rate: Decimal,
    vat_rate: Decimal,
) -> Result<InvoiceLineBreakdown, ValidationError> {
    let too_large = || ValidationError::TooLarge {
        field: "unitPrice".to_string(),
    };

    let line_total = unit_price.checked_mul(quantity).ok_or_else(too_large)?;
    let discount = line_total.checked_percent(discount_rate).ok_or_else(too_large)?;
    let after_discount = line_total.checked_sub(discount).ok_or_else(too_large)?;
    let vat = after_discount.checked_percent(vat_rate).ok_or_else(too_large)?;
    let total = after_discount.checked_add(vat).ok_or_else(too_large)?;

    Ok(InvoiceLineBreakdown {
        line_total,
        discount,
        after_discount,
        vat,
        total,
    })
}

/// Sum of item totals.
///
/// [`ValidationError::TooLarge`] when the sum leaves the decimal range.
pub fn invoice_total(items: &[PurchaseInvoiceItem]) -> Result<Money, ValidationError> {
    items
        .iter()
        .try_fold(Money::zero(), |acc, item| acc.checked_add(item.total))
        .ok_or_else(|| ValidationError::TooLarge {
            field: "total".to_string(),
        })
}

// =============================================================================
// Date Ranges
// =============================================================================

/// Optional calendar-day bounds, both inclusive.
///
/// `end` covers its whole day, so an entry at 23:59 on the end date is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Range with no bounds.
    pub const fn all() -> Self {
        DateRange {
            start: None,
            end: None,
        }
    }

    /// Range covering `start..=end`.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Rejects a range whose start lies after its end.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start > end => Err(ValidationError::InvalidFormat {
                field: "dateRange".to_string(),
                reason: format!("start {start} is after end {end}"),
            }),
            _ => Ok(()),
        }
    }

    /// True if `at` falls inside the range.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < start_of_day(start) {
                return false;
            }
        }
        if let Some(end) = self.end {
            // Exclusive upper bound at the next midnight.
            match end.checked_add_days(Days::new(1)) {
                Some(next) if at >= start_of_day(next) => return false,
                _ => {}
            }
        }
        true
    }
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Customer Statement
// =============================================================================

/// Where a statement line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Invoice,
    Payment,
}

/// One row of a customer statement, annotated with the running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    pub id: String,
    pub date: DateTime<Utc>,
    pub description: String,
    /// Invoices positive, payments negative.
    pub amount: Money,
    pub kind: StatementKind,
    /// Invoice number for invoice lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub balance: Money,
}

/// Builds a customer statement.
///
/// ## Steps
/// 1. Collect the customer's invoices (+total) then their expense
///    payments (−amount), each in collection order.
/// 2. Stable sort by date, so same-date rows keep that order.
/// 3. Drop rows outside `range`.
/// 4. Fold a running balance from zero over what's left.
///
/// Filtering happens before the fold: with a range, `balance` is relative
/// to the window, not the customer's all-time balance. Running balances
/// saturate at the decimal range instead of panicking.
pub fn customer_statement(
    customer_id: &str,
    invoices: &[PurchaseInvoice],
    entries: &[CashEntry],
    range: &DateRange,
) -> Vec<StatementLine> {
    let invoice_rows = invoices
        .iter()
        .filter(|inv| inv.customer_id == customer_id)
        .map(|inv| StatementLine {
            id: inv.id.clone(),
            date: start_of_day(inv.date),
            description: format!("Purchase invoice {}", inv.invoice_number),
            amount: inv.total,
            kind: StatementKind::Invoice,
            reference: Some(inv.invoice_number.clone()),
            balance: Money::zero(),
        });

    let payment_rows = entries
        .iter()
        .filter(|entry| entry.paid_customer() == Some(customer_id))
        .map(|entry| StatementLine {
            id: entry.id.clone(),
            date: entry.date,
            description: format!("Payment - {}", entry.payment_type),
            amount: -entry.amount,
            kind: StatementKind::Payment,
            reference: None,
            balance: Money::zero(),
        });

    let mut rows: Vec<StatementLine> = invoice_rows.chain(payment_rows).collect();
    // `sort_by_key` is stable.
    rows.sort_by_key(|row| row.date);
    rows.retain(|row| range.contains(row.date));

    let mut running = Money::zero();
    for row in &mut rows {
        running = running.saturating_add(row.amount);
        row.balance = running;
    }
    rows
}

// =============================================================================
// Cash Balance
// =============================================================================

/// Net cash position per payment type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashBalance {
    pub cash: Money,
    pub credit_card: Money,
}

impl CashBalance {
    /// Cash plus card.
    pub fn total(&self) -> Money {
        self.cash.saturating_add(self.credit_card)
    }
}

/// Folds every entry into per-type totals: income adds, expense subtracts.
///
/// Totals saturate at the decimal range.
pub fn compute_cash_balance(entries: &[CashEntry]) -> CashBalance {
    entries
        .iter()
        .fold(CashBalance::default(), |mut acc, entry| {
            match entry.payment_type {
                PaymentType::Cash => acc.cash = acc.cash.saturating_add(entry.signed_amount()),
                PaymentType::CreditCard => {
                    acc.credit_card = acc.credit_card.saturating_add(entry.signed_amount())
                }
            }
            acc
        })
}

// =============================================================================
// Payment Report
// =============================================================================

/// Expense totals inside a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub cash: Money,
    pub credit_card: Money,
    pub total: Money,
    pub count: usize,
}

/// Sums expense entries in `range`, split by payment type.
pub fn payment_summary(entries: &[CashEntry], range: &DateRange) -> PaymentSummary {
    entries
        .iter()
        .filter(|entry| entry.transaction_type == TransactionType::Expense)
        .filter(|entry| range.contains(entry.date))
        .fold(PaymentSummary::default(), |mut acc, entry| {
            match entry.payment_type {
                PaymentType::Cash => acc.cash = acc.cash.saturating_add(entry.amount),
                PaymentType::CreditCard => {
                    acc.credit_card = acc.credit_card.saturating_add(entry.amount)
                }
            }
            acc.total = acc.total.saturating_add(entry.amount);
            acc.count += 1;
            acc
        })
}

// =============================================================================
// Menu Costing
// =============================================================================

/// Σ quantity × current price. Ingredients whose product is gone cost 0.
pub fn compute_menu_item_cost(
    ingredients: &[MenuIngredient],
    products: &[Product],
) -> Result<Money, ValidationError> {
    ingredients
        .iter()
        .filter_map(|ingredient| {
            products
                .iter()
                .find(|p| p.id == ingredient.product_id)
                .map(|p| (p.current_price, ingredient.quantity))
        })
        .try_fold(Money::zero(), |acc, (price, quantity)| {
            acc.checked_add(price.checked_mul(quantity)?)
        })
        .ok_or_else(|| ValidationError::TooLarge {
            field: "ingredients".to_string(),
        })
}

// =============================================================================
// Balance Reconstruction
// =============================================================================

/// Recomputes every customer's balance from invoices and expense payments.
///
/// Invoices or payments that reference a customer not in `customers` are
/// ignored. Sums saturate at the decimal range; such a balance can never
/// have been written, so it always shows up as drift.
pub fn expected_balances(
    customers: &[Customer],
    invoices: &[PurchaseInvoice],
    entries: &[CashEntry],
) -> HashMap<String, Money> {
    let mut balances: HashMap<String, Money> = customers
        .iter()
        .map(|c| (c.id.clone(), Money::zero()))
        .collect();

    for invoice in invoices {
        if let Some(balance) = balances.get_mut(&invoice.customer_id) {
            *balance = balance.saturating_add(invoice.total);
        }
    }
    for entry in entries {
        if let Some(balance) = entry.paid_customer().and_then(|id| balances.get_mut(id)) {
            *balance = balance.saturating_sub(entry.amount);
        }
    }
    balances
}

/// A customer whose stored balance disagrees with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDiscrepancy {
    pub customer_id: String,
    pub recorded: Money,
    pub expected: Money,
}

/// Lists customers whose stored balance breaks the balance invariant.
pub fn audit_balances(
    customers: &[Customer],
    invoices: &[PurchaseInvoice],
    entries: &[CashEntry],
) -> Vec<BalanceDiscrepancy> {
    let expected = expected_balances(customers, invoices, entries);
    customers
        .iter()
        .filter_map(|c| {
            let want = expected.get(&c.id).copied().unwrap_or_default();
            (want != c.balance).then(|| BalanceDiscrepancy {
                customer_id: c.id.clone(),
                recorded: c.balance,
                expected: want,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn money(d: Decimal) -> Money {
        Money::new(d)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn invoice(id: &str, customer: &str, on: NaiveDate, total: Decimal) -> PurchaseInvoice {
        PurchaseInvoice {
            id: id.into(),
            customer_id: customer.into(),
            invoice_number: format!("N-{id}"),
            date: on,
            items: Vec::new(),
            total: money(total),
            created_at: at(2024, 1, 1, 0),
        }
    }

    fn entry(
        id: &str,
        when: DateTime<Utc>,
        amount: Decimal,
        payment_type: PaymentType,
        transaction_type: TransactionType,
        customer: Option<&str>,
    ) -> CashEntry {
        CashEntry {
            id: id.into(),
            date: when,
            amount: money(amount),
            payment_type,
            description: String::new(),
            transaction_type,
            customer_id: customer.map(String::from),
        }
    }

    fn customer(id: &str, balance: Decimal) -> Customer {
        Customer {
            id: id.into(),
            title: id.to_uppercase(),
            tax_number: String::new(),
            phone: String::new(),
            balance: money(balance),
            created_at: at(2024, 1, 1, 0),
        }
    }

    #[test]
    fn test_line_breakdown() {
        let line = compute_line(dec!(10), money(dec!(5)), dec!(10), dec!(20)).unwrap();
        assert_eq!(line.line_total, money(dec!(50)));
        assert_eq!(line.discount, money(dec!(5)));
        assert_eq!(line.after_discount, money(dec!(45)));
        assert_eq!(line.vat, money(dec!(9)));
        assert_eq!(line.total, money(dec!(54)));
    }

    #[test]
    fn test_unusual_vat_is_computed_not_rejected() {
        let line = compute_line(dec!(1), money(dec!(100)), dec!(0), dec!(7)).unwrap();
        assert_eq!(line.total, money(dec!(107)));
    }

    #[test]
    fn test_line_matches_closed_form() {
        let (q, p, d, v) = (dec!(3), dec!(19.99), dec!(12.5), dec!(10));
        let line = compute_line(q, money(p), d, v).unwrap();
        let closed = q * p * (Decimal::ONE - d / dec!(100)) * (Decimal::ONE + v / dec!(100));
        assert_eq!(line.total, money(closed));
    }

    #[test]
    fn test_line_overflow_is_a_validation_error() {
        let err = compute_line(
            dec!(1000000000000000),
            money(dec!(1000000000000000)),
            dec!(0),
            dec!(20),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::TooLarge { ref field } if field == "unitPrice"));

        // The product fits; only the VAT on top of it does not.
        let near_max = Decimal::MAX / dec!(4);
        assert!(compute_line(dec!(2), money(near_max), dec!(0), dec!(0)).is_ok());
        assert!(compute_line(dec!(2), money(near_max), dec!(0), dec!(20)).is_err());
    }

    #[test]
    fn test_invoice_total_overflow() {
        let item = |total: Decimal| PurchaseInvoiceItem {
            id: "it".into(),
            product_id: "p1".into(),
            quantity: dec!(1),
            unit_price: money(total),
            discount_rate: dec!(0),
            vat_rate: dec!(0),
            total: money(total),
        };
        let fits = vec![item(dec!(54)), item(dec!(6))];
        assert_eq!(invoice_total(&fits).unwrap(), money(dec!(60)));

        let overflows = vec![item(Decimal::MAX), item(dec!(1))];
        assert!(matches!(
            invoice_total(&overflows),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_running_balance_fold() {
        let invoices = vec![
            invoice("i1", "c1", date(2024, 3, 1), dec!(100)),
            invoice("i2", "c1", date(2024, 3, 3), dec!(20)),
            invoice("other", "c2", date(2024, 3, 2), dec!(999)),
        ];
        let entries = vec![entry(
            "e1",
            at(2024, 3, 2, 9),
            dec!(30),
            PaymentType::Cash,
            TransactionType::Expense,
            Some("c1"),
        )];

        let rows = customer_statement("c1", &invoices, &entries, &DateRange::all());
        let balances: Vec<_> = rows.iter().map(|r| r.balance).collect();
        assert_eq!(balances, vec![money(dec!(100)), money(dec!(70)), money(dec!(90))]);
        assert_eq!(rows[1].kind, StatementKind::Payment);
        assert_eq!(rows[1].amount, money(dec!(-30)));
        assert_eq!(rows[0].reference.as_deref(), Some("N-i1"));
    }

    #[test]
    fn test_same_date_keeps_insertion_order() {
        let invoices = vec![
            invoice("i1", "c1", date(2024, 3, 1), dec!(10)),
            invoice("i2", "c1", date(2024, 3, 1), dec!(20)),
        ];
        let entries = vec![entry(
            "e1",
            start_of_day(date(2024, 3, 1)),
            dec!(5),
            PaymentType::Cash,
            TransactionType::Expense,
            Some("c1"),
        )];
        let rows = customer_statement("c1", &invoices, &entries, &DateRange::all());
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["i1", "i2", "e1"]);
    }

    #[test]
    fn test_statement_window_folds_after_filter() {
        let invoices = vec![
            invoice("i1", "c1", date(2024, 1, 10), dec!(500)),
            invoice("i2", "c1", date(2024, 2, 10), dec!(40)),
        ];
        let range = DateRange::between(date(2024, 2, 1), date(2024, 2, 28));
        let rows = customer_statement("c1", &invoices, &[], &range);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, money(dec!(40)));
    }

    #[test]
    fn test_income_and_other_customers_stay_off_statement() {
        let entries = vec![
            entry("e1", at(2024, 3, 1, 9), dec!(10), PaymentType::Cash, TransactionType::Income, Some("c1")),
            entry("e2", at(2024, 3, 1, 9), dec!(10), PaymentType::Cash, TransactionType::Expense, Some("c2")),
            entry("e3", at(2024, 3, 1, 9), dec!(10), PaymentType::Cash, TransactionType::Expense, None),
        ];
        assert!(customer_statement("c1", &[], &entries, &DateRange::all()).is_empty());
    }

    #[test]
    fn test_range_end_day_is_inclusive() {
        let range = DateRange::between(date(2024, 3, 1), date(2024, 3, 31));
        assert!(range.contains(Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap()));
        assert!(!range.contains(at(2024, 4, 1, 0)));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()));
        assert!(DateRange::all().contains(at(1999, 1, 1, 0)));
    }

    #[test]
    fn test_range_validation() {
        assert!(DateRange::between(date(2024, 3, 2), date(2024, 3, 1)).validate().is_err());
        assert!(DateRange::between(date(2024, 3, 1), date(2024, 3, 1)).validate().is_ok());
    }

    #[test]
    fn test_cash_balance_per_type() {
        let entries = vec![
            entry("a", at(2024, 3, 1, 9), dec!(100), PaymentType::Cash, TransactionType::Income, None),
            entry("b", at(2024, 3, 1, 9), dec!(30), PaymentType::Cash, TransactionType::Expense, Some("c1")),
            entry("c", at(2024, 3, 1, 9), dec!(50), PaymentType::CreditCard, TransactionType::Income, None),
            entry("d", at(2024, 3, 1, 9), dec!(70), PaymentType::CreditCard, TransactionType::Expense, None),
        ];
        let balance = compute_cash_balance(&entries);
        assert_eq!(balance.cash, money(dec!(70)));
        assert_eq!(balance.credit_card, money(dec!(-20)));
        assert_eq!(balance.total(), money(dec!(50)));
    }

    #[test]
    fn test_cash_balance_saturates() {
        let entries = vec![
            entry("a", at(2024, 3, 1, 9), Decimal::MAX, PaymentType::Cash, TransactionType::Income, None),
            entry("b", at(2024, 3, 2, 9), Decimal::MAX, PaymentType::Cash, TransactionType::Income, None),
        ];
        let balance = compute_cash_balance(&entries);
        assert_eq!(balance.cash, money(Decimal::MAX));
        assert_eq!(balance.total(), money(Decimal::MAX));
    }

    #[test]
    fn test_payment_summary_counts_expenses_in_range() {
        let entries = vec![
            entry("a", at(2024, 3, 1, 9), dec!(100), PaymentType::Cash, TransactionType::Income, None),
            entry("b", at(2024, 3, 5, 9), dec!(30), PaymentType::Cash, TransactionType::Expense, None),
            entry("c", at(2024, 3, 6, 23), dec!(12.5), PaymentType::CreditCard, TransactionType::Expense, None),
            entry("d", at(2024, 4, 1, 9), dec!(99), PaymentType::Cash, TransactionType::Expense, None),
        ];
        let range = DateRange::between(date(2024, 3, 1), date(2024, 3, 31));
        let summary = payment_summary(&entries, &range);
        assert_eq!(summary.cash, money(dec!(30)));
        assert_eq!(summary.credit_card, money(dec!(12.5)));
        assert_eq!(summary.total, money(dec!(42.5)));
        assert_eq!(summary.count, 2);
    }

    #[test]
    fn test_menu_cost_skips_missing_products() {
        let products = vec![Product {
            id: "flour".into(),
            name: "Flour".into(),
            unit: "kg".into(),
            vat_rate: dec!(1),
            current_price: money(dec!(12)),
            updated_at: at(2024, 1, 1, 0),
        }];
        let ingredients = vec![
            MenuIngredient { product_id: "flour".into(), quantity: dec!(0.25) },
            MenuIngredient { product_id: "gone".into(), quantity: dec!(3) },
        ];
        assert_eq!(compute_menu_item_cost(&ingredients, &products).unwrap(), money(dec!(3)));

        let bulk = vec![MenuIngredient { product_id: "flour".into(), quantity: Decimal::MAX }];
        assert!(matches!(
            compute_menu_item_cost(&bulk, &products),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_audit_finds_drift() {
        let customers = vec![customer("c1", dec!(70)), customer("c2", dec!(5))];
        let invoices = vec![invoice("i1", "c1", date(2024, 3, 1), dec!(100))];
        let entries = vec![entry(
            "e1",
            at(2024, 3, 2, 9),
            dec!(30),
            PaymentType::Cash,
            TransactionType::Expense,
            Some("c1"),
        )];

        let expected = expected_balances(&customers, &invoices, &entries);
        assert_eq!(expected["c1"], money(dec!(70)));
        assert_eq!(expected["c2"], Money::zero());

        let drift = audit_balances(&customers, &invoices, &entries);
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].customer_id, "c2");
        assert_eq!(drift[0].recorded, money(dec!(5)));
    }
}
