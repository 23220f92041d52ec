//! # Domain Types
//!
//! The five collections of the books, plus the drafts callers submit.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │◄──│ PurchaseInvoice │──►│    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  title          │   │  customer_id    │   │  name, unit     │       │
//! │  │  balance (derived)  │  items[] total  │   │  current_price  │       │
//! │  └────────▲────────┘   └─────────────────┘   └────────▲────────┘       │
//! │           │                                           │                 │
//! │  ┌────────┴────────┐                         ┌────────┴────────┐       │
//! │  │   CashEntry     │                         │    MenuItem     │       │
//! │  │  ─────────────  │                         │  ─────────────  │       │
//! │  │  amount, type   │                         │  ingredients[]  │       │
//! │  │  income|expense │                         │  total_cost     │       │
//! │  │  customer_id?   │                         │  (derived)      │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shape
//! Entity fields serialize in camelCase (`customerId`, `taxNumber`, ...),
//! which is the shape stored in every collection and inside snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Collections
// =============================================================================

/// The five independently keyed collections of the books.
///
/// The key doubles as the storage key and as the snapshot field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    CashEntries,
    Customers,
    Products,
    PurchaseInvoices,
    MenuItems,
}

impl Collection {
    /// Every collection, in snapshot field order.
    pub const ALL: [Collection; 5] = [
        Collection::CashEntries,
        Collection::Customers,
        Collection::Products,
        Collection::PurchaseInvoices,
        Collection::MenuItems,
    ];

    /// Storage key for this collection.
    pub const fn key(&self) -> &'static str {
        match self {
            Collection::CashEntries => "cash_entries",
            Collection::Customers => "customers",
            Collection::Products => "products",
            Collection::PurchaseInvoices => "purchase_invoices",
            Collection::MenuItems => "menu_items",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// Enums
// =============================================================================

/// How money moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    CreditCard,
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentType::Cash => write!(f, "cash"),
            PaymentType::CreditCard => write!(f, "credit card"),
        }
    }
}

/// Direction of a cash entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
}

// =============================================================================
// Cash Entry
// =============================================================================

/// A cash or card movement.
///
/// An expense carrying `customer_id` is a payment to that customer and
/// reduces their balance. Cash entries are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub amount: Money,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub description: String,
    pub transaction_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

impl CashEntry {
    /// Returns the customer this entry pays, if it is a customer payment.
    #[inline]
    pub fn paid_customer(&self) -> Option<&str> {
        match self.transaction_type {
            TransactionType::Expense => self.customer_id.as_deref(),
            TransactionType::Income => None,
        }
    }

    /// Amount with its sign applied: income positive, expense negative.
    #[inline]
    pub fn signed_amount(&self) -> Money {
        match self.transaction_type {
            TransactionType::Income => self.amount,
            TransactionType::Expense => -self.amount,
        }
    }
}

/// Input for recording a cash entry.
///
/// `date` defaults to the time of recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCashEntry {
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub description: String,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub customer_id: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// A supplier account.
///
/// `balance` is what the business owes this customer: invoices add to it,
/// expense payments subtract from it. It is never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tax_number: String,
    #[serde(default)]
    pub phone: String,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub title: String,
    #[serde(default)]
    pub tax_number: String,
    #[serde(default)]
    pub phone: String,
}

// =============================================================================
// Product
// =============================================================================

/// A stock item.
///
/// `current_price` is overwritten by every invoice that lists the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub vat_rate: Decimal,
    pub current_price: Money,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub vat_rate: Option<Decimal>,
    #[serde(default)]
    pub current_price: Money,
}

// =============================================================================
// Purchase Invoice
// =============================================================================

/// One priced line of a purchase invoice. `total` is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInvoiceItem {
    pub id: String,
    pub product_id: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount_rate: Decimal,
    pub vat_rate: Decimal,
    pub total: Money,
}

/// A purchase from a customer. `total` is the sum of its item totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseInvoice {
    pub id: String,
    pub customer_id: String,
    pub invoice_number: String,
    pub date: NaiveDate,
    pub items: Vec<PurchaseInvoiceItem>,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

/// A line as entered. Lines without product, quantity or unit price are
/// blank rows and get dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineDraft {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub discount_rate: Decimal,
    #[serde(default)]
    pub vat_rate: Option<Decimal>,
}

impl InvoiceLineDraft {
    /// True when product, quantity and unit price are all filled in.
    pub fn is_complete(&self) -> bool {
        self.product_id.as_deref().is_some_and(|p| !p.trim().is_empty())
            && self.quantity.is_some()
            && self.unit_price.is_some()
    }
}

/// Input for recording a purchase invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub invoice_number: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub items: Vec<InvoiceLineDraft>,
}

// =============================================================================
// Menu Item
// =============================================================================

/// Quantity of a product used by a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuIngredient {
    pub product_id: String,
    pub quantity: Decimal,
}

/// A recipe costed from current product prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<MenuIngredient>,
    pub total_cost: Money,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a menu item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<MenuIngredient>,
}

// =============================================================================
// Unit Tests
// =============================================================================
