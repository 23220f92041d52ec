//! # Ledger Service
//!
//! Business operations over the books. Each mutating operation is one
//! critical section on [`Books`] ending in one atomic commit, so the balance
//! invariant holds after every operation that returns.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation            Writes (one batch)               Balance effect   │
//! │  ───────────────────  ───────────────────────────────  ──────────────── │
//! │  record_invoice       invoices, customers, products    += total         │
//! │  delete_invoice       invoices, customers              −= total         │
//! │  record_cash_entry    cash_entries (+ customers)       −= amount if     │
//! │                                                        expense+customer │
//! │  create_customer      customers                        starts at 0      │
//! │  create_product       products                         -                │
//! │  create_menu_item     menu_items                       -                │
//! │  delete_menu_item     menu_items                       -                │
//! │  refresh_menu_costs   menu_items                       -                │
//! │  reconcile_balances   customers                        rebuilt          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cash Entries Are Permanent
//! There is no delete for cash entries. A mistaken entry is corrected by
//! recording a compensating one. Invoices can be deleted, and deleting one
//! reverses its balance effect exactly; the product prices it set stay.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tally_core::ledger::{
    self, BalanceDiscrepancy, CashBalance, DateRange, PaymentSummary, StatementLine,
};
use tally_core::validation::{
    require_id, validate_amount, validate_percentage, validate_price, validate_quantity,
    validate_required,
};
use tally_core::{
    CashEntry, Collection, CoreError, Customer, InvoiceDraft, MenuIngredient, MenuItem, Money,
    NewCashEntry, NewCustomer, NewMenuItem, NewProduct, Product, PurchaseInvoice,
    PurchaseInvoiceItem, ValidationError, DEFAULT_PRODUCT_UNIT, DEFAULT_VAT_RATE,
};
use tracing::{debug, info, warn};

use crate::books::Books;
use crate::error::LedgerResult;
use crate::store::WriteBatch;

// =============================================================================
// Overview
// =============================================================================

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub cash_balance: CashBalance,
    /// Σ customer balances: what the business owes its suppliers in total.
    pub total_customer_balance: Money,
    pub customer_count: usize,
    pub product_count: usize,
    pub invoice_count: usize,
    pub cash_entry_count: usize,
    pub menu_item_count: usize,
}

// =============================================================================
// Ledger Service
// =============================================================================

/// Business operations over shared [`Books`].
#[derive(Clone)]
pub struct LedgerService {
    books: Arc<Books>,
}

impl LedgerService {
    /// Creates a service over `books`.
    pub fn new(books: Arc<Books>) -> Self {
        LedgerService { books }
    }

    /// The underlying books (for subscribing to changes, export, restore).
    pub fn books(&self) -> &Arc<Books> {
        &self.books
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Creates a customer with a zero balance.
    pub async fn create_customer(&self, draft: NewCustomer) -> LedgerResult<Customer> {
        let title = validate_required("title", &draft.title)?;

        let guard = self.books.write().await;
        let mut customers: Vec<Customer> = guard.read(Collection::Customers).await?;

        let customer = Customer {
            id: guard.generate_id(),
            title,
            tax_number: draft.tax_number.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            balance: Money::zero(),
            created_at: Utc::now(),
        };
        customers.push(customer.clone());

        let mut batch = WriteBatch::new();
        batch.put(Collection::Customers, &customers)?;
        guard.commit(batch).await?;

        info!(customer_id = %customer.id, title = %customer.title, "Customer created");
        Ok(customer)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product. Unit defaults to "adet", VAT to 20%.
    pub async fn create_product(&self, draft: NewProduct) -> LedgerResult<Product> {
        let name = validate_required("name", &draft.name)?;
        validate_price("currentPrice", draft.current_price)?;
        let unit = draft
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_PRODUCT_UNIT)
            .to_string();
        let vat_rate = draft.vat_rate.unwrap_or(Decimal::from(DEFAULT_VAT_RATE));

        let guard = self.books.write().await;
        let mut products: Vec<Product> = guard.read(Collection::Products).await?;

        let product = Product {
            id: guard.generate_id(),
            name,
            unit,
            vat_rate,
            current_price: draft.current_price,
            updated_at: Utc::now(),
        };
        products.push(product.clone());

        let mut batch = WriteBatch::new();
        batch.put(Collection::Products, &products)?;
        guard.commit(batch).await?;

        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    // =========================================================================
    // Cash Entries
    // =========================================================================

    /// Appends a cash entry.
    ///
    /// An expense with a customer also lowers that customer's balance by
    /// `amount`, in the same commit. Income never touches balances.
    ///
    /// ## Errors
    /// - Validation: amount missing or not positive, description blank,
    ///   or the payment would push the balance past the decimal range
    /// - `CustomerNotFound`: expense references an unknown customer
    pub async fn record_cash_entry(&self, draft: NewCashEntry) -> LedgerResult<CashEntry> {
        let amount = validate_amount("amount", draft.amount)?;
        let description = validate_required("description", &draft.description)?;
        let customer_id = draft
            .customer_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);

        let guard = self.books.write().await;

        let entry = CashEntry {
            id: guard.generate_id(),
            date: draft.date.unwrap_or_else(Utc::now),
            amount,
            payment_type: draft.payment_type,
            description,
            transaction_type: draft.transaction_type,
            customer_id,
        };

        let mut batch = WriteBatch::new();

        if let Some(paid) = entry.paid_customer() {
            let mut customers: Vec<Customer> = guard.read(Collection::Customers).await?;
            let customer = customers
                .iter_mut()
                .find(|c| c.id == paid)
                .ok_or_else(|| CoreError::CustomerNotFound(paid.to_string()))?;
            customer.balance = customer
                .balance
                .checked_sub(entry.amount)
                .ok_or_else(|| ValidationError::TooLarge {
                    field: "amount".to_string(),
                })?;
            debug!(customer_id = %paid, balance = %customer.balance, "Payment applied");
            batch.put(Collection::Customers, &customers)?;
        }

        let mut entries: Vec<CashEntry> = guard.read(Collection::CashEntries).await?;
        entries.push(entry.clone());
        batch.put(Collection::CashEntries, &entries)?;

        guard.commit(batch).await?;

        info!(
            entry_id = %entry.id,
            amount = %entry.amount,
            kind = ?entry.transaction_type,
            "Cash entry recorded"
        );
        Ok(entry)
    }

    // =========================================================================
    // Purchase Invoices
    // =========================================================================

    /// Records a purchase invoice.
    ///
    /// ## Effects (one commit)
    /// 1. Invoice appended, each item priced with
    ///    [`ledger::compute_line`], total = Σ item totals.
    /// 2. Customer balance += total.
    /// 3. Each referenced product's `current_price` set to the line's unit
    ///    price (first line wins when a product appears twice).
    ///
    /// Blank lines (no product, quantity or unit price) are dropped before
    /// validation. Lines naming a product that doesn't exist are kept; they
    /// just have no price to update.
    ///
    /// ## Errors
    /// - Validation: no customer, no complete line, quantity ≤ 0,
    ///   negative unit price, discount outside 0..=100, or amounts past
    ///   the decimal range
    /// - `CustomerNotFound`: unknown customer
    pub async fn record_invoice(&self, draft: InvoiceDraft) -> LedgerResult<PurchaseInvoice> {
        let customer_id = require_id("customerId", draft.customer_id.as_deref())?;
        let lines = validate_lines(&draft)?;

        let guard = self.books.write().await;
        let mut customers: Vec<Customer> = guard.read(Collection::Customers).await?;
        let mut products: Vec<Product> = guard.read(Collection::Products).await?;
        let mut invoices: Vec<PurchaseInvoice> = guard.read(Collection::PurchaseInvoices).await?;

        let customer = customers
            .iter_mut()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?;

        let items = lines
            .into_iter()
            .map(|line| {
                let priced = ledger::compute_line(
                    line.quantity,
                    line.unit_price,
                    line.discount_rate,
                    line.vat_rate,
                )?;
                Ok(PurchaseInvoiceItem {
                    id: guard.generate_id(),
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discount_rate: line.discount_rate,
                    vat_rate: line.vat_rate,
                    total: priced.total,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let now = Utc::now();
        let invoice = PurchaseInvoice {
            id: guard.generate_id(),
            customer_id: customer_id.clone(),
            invoice_number: draft.invoice_number.trim().to_string(),
            date: draft.date,
            total: ledger::invoice_total(&items)?,
            items,
            created_at: now,
        };

        customer.balance = customer
            .balance
            .checked_add(invoice.total)
            .ok_or_else(|| ValidationError::TooLarge {
                field: "total".to_string(),
            })?;

        for item in &invoice.items {
            if !products.iter().any(|p| p.id == item.product_id) {
                warn!(product_id = %item.product_id, "Invoice line references unknown product");
            }
        }
        for product in products.iter_mut() {
            if let Some(item) = invoice.items.iter().find(|i| i.product_id == product.id) {
                product.current_price = item.unit_price;
                product.updated_at = now;
            }
        }

        invoices.push(invoice.clone());

        let mut batch = WriteBatch::new();
        batch
            .put(Collection::PurchaseInvoices, &invoices)?
            .put(Collection::Customers, &customers)?
            .put(Collection::Products, &products)?;
        guard.commit(batch).await?;

        info!(
            invoice_id = %invoice.id,
            customer_id = %invoice.customer_id,
            total = %invoice.total,
            items = invoice.items.len(),
            "Invoice recorded"
        );
        Ok(invoice)
    }

    /// Deletes an invoice and subtracts exactly its total from the customer.
    ///
    /// Product prices set by the invoice are not reverted. Returns the
    /// removed invoice.
    pub async fn delete_invoice(&self, invoice_id: &str) -> LedgerResult<PurchaseInvoice> {
        let guard = self.books.write().await;
        let mut invoices: Vec<PurchaseInvoice> = guard.read(Collection::PurchaseInvoices).await?;

        let index = invoices
            .iter()
            .position(|inv| inv.id == invoice_id)
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;
        let invoice = invoices.remove(index);

        let mut customers: Vec<Customer> = guard.read(Collection::Customers).await?;
        match customers.iter_mut().find(|c| c.id == invoice.customer_id) {
            Some(customer) => {
                customer.balance = customer.balance.checked_sub(invoice.total).ok_or_else(|| {
                    ValidationError::TooLarge {
                        field: "total".to_string(),
                    }
                })?
            }
            None => warn!(
                invoice_id = %invoice.id,
                customer_id = %invoice.customer_id,
                "Deleting invoice of unknown customer"
            ),
        }

        let mut batch = WriteBatch::new();
        batch
            .put(Collection::PurchaseInvoices, &invoices)?
            .put(Collection::Customers, &customers)?;
        guard.commit(batch).await?;

        info!(invoice_id = %invoice.id, total = %invoice.total, "Invoice deleted");
        Ok(invoice)
    }

    // =========================================================================
    // Menu Items
    // =========================================================================

    /// Creates a menu item costed from current product prices.
    ///
    /// Ingredients without a product or with a non-positive quantity are
    /// dropped.
    pub async fn create_menu_item(&self, draft: NewMenuItem) -> LedgerResult<MenuItem> {
        let name = validate_required("name", &draft.name)?;
        let ingredients: Vec<MenuIngredient> = draft
            .ingredients
            .into_iter()
            .filter(|i| !i.product_id.trim().is_empty() && i.quantity > Decimal::ZERO)
            .collect();

        let guard = self.books.write().await;
        let products: Vec<Product> = guard.read(Collection::Products).await?;
        let mut menu_items: Vec<MenuItem> = guard.read(Collection::MenuItems).await?;

        let item = MenuItem {
            id: guard.generate_id(),
            name,
            total_cost: ledger::compute_menu_item_cost(&ingredients, &products)?,
            ingredients,
            updated_at: Utc::now(),
        };
        menu_items.push(item.clone());

        let mut batch = WriteBatch::new();
        batch.put(Collection::MenuItems, &menu_items)?;
        guard.commit(batch).await?;

        info!(menu_item_id = %item.id, cost = %item.total_cost, "Menu item created");
        Ok(item)
    }

    /// Deletes a menu item.
    pub async fn delete_menu_item(&self, menu_item_id: &str) -> LedgerResult<()> {
        let guard = self.books.write().await;
        let mut menu_items: Vec<MenuItem> = guard.read(Collection::MenuItems).await?;

        let index = menu_items
            .iter()
            .position(|m| m.id == menu_item_id)
            .ok_or_else(|| CoreError::MenuItemNotFound(menu_item_id.to_string()))?;
        menu_items.remove(index);

        let mut batch = WriteBatch::new();
        batch.put(Collection::MenuItems, &menu_items)?;
        guard.commit(batch).await?;

        info!(menu_item_id, "Menu item deleted");
        Ok(())
    }

    /// Recomputes every menu item's cost from current prices.
    pub async fn refresh_menu_costs(&self) -> LedgerResult<Vec<MenuItem>> {
        let guard = self.books.write().await;
        let products: Vec<Product> = guard.read(Collection::Products).await?;
        let mut menu_items: Vec<MenuItem> = guard.read(Collection::MenuItems).await?;

        if menu_items.is_empty() {
            return Ok(menu_items);
        }

        let now = Utc::now();
        for item in menu_items.iter_mut() {
            item.total_cost = ledger::compute_menu_item_cost(&item.ingredients, &products)?;
            item.updated_at = now;
        }

        let mut batch = WriteBatch::new();
        batch.put(Collection::MenuItems, &menu_items)?;
        guard.commit(batch).await?;

        debug!(count = menu_items.len(), "Menu costs refreshed");
        Ok(menu_items)
    }

    // =========================================================================
    // Balance Reconstruction
    // =========================================================================

    /// Lists customers whose stored balance disagrees with their invoices
    /// and payments.
    pub async fn audit_balances(&self) -> Vec<BalanceDiscrepancy> {
        let customers: Vec<Customer> = self.books.read(Collection::Customers).await;
        let invoices: Vec<PurchaseInvoice> = self.books.read(Collection::PurchaseInvoices).await;
        let entries: Vec<CashEntry> = self.books.read(Collection::CashEntries).await;
        ledger::audit_balances(&customers, &invoices, &entries)
    }

    /// Rewrites drifted customer balances from invoices and payments.
    ///
    /// Returns what was corrected. Commits nothing when every balance
    /// already matches.
    pub async fn reconcile_balances(&self) -> LedgerResult<Vec<BalanceDiscrepancy>> {
        let guard = self.books.write().await;
        let mut customers: Vec<Customer> = guard.read(Collection::Customers).await?;
        let invoices: Vec<PurchaseInvoice> = guard.read(Collection::PurchaseInvoices).await?;
        let entries: Vec<CashEntry> = guard.read(Collection::CashEntries).await?;

        let drift = ledger::audit_balances(&customers, &invoices, &entries);
        if drift.is_empty() {
            return Ok(drift);
        }

        for fix in &drift {
            if let Some(customer) = customers.iter_mut().find(|c| c.id == fix.customer_id) {
                customer.balance = fix.expected;
            }
        }

        let mut batch = WriteBatch::new();
        batch.put(Collection::Customers, &customers)?;
        guard.commit(batch).await?;

        warn!(corrected = drift.len(), "Customer balances reconciled");
        Ok(drift)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All customers.
    pub async fn customers(&self) -> Vec<Customer> {
        self.books.read(Collection::Customers).await
    }

    /// All products.
    pub async fn products(&self) -> Vec<Product> {
        self.books.read(Collection::Products).await
    }

    /// All cash entries.
    pub async fn cash_entries(&self) -> Vec<CashEntry> {
        self.books.read(Collection::CashEntries).await
    }

    /// All purchase invoices.
    pub async fn invoices(&self) -> Vec<PurchaseInvoice> {
        self.books.read(Collection::PurchaseInvoices).await
    }

    /// All menu items.
    pub async fn menu_items(&self) -> Vec<MenuItem> {
        self.books.read(Collection::MenuItems).await
    }

    /// Statement for one customer, optionally windowed by `range`.
    ///
    /// See [`ledger::customer_statement`] for ordering and windowing rules.
    pub async fn customer_statement(
        &self,
        customer_id: &str,
        range: &DateRange,
    ) -> LedgerResult<Vec<StatementLine>> {
        range.validate()?;

        let customers = self.customers().await;
        if !customers.iter().any(|c| c.id == customer_id) {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }

        let invoices = self.invoices().await;
        let entries = self.cash_entries().await;
        Ok(ledger::customer_statement(customer_id, &invoices, &entries, range))
    }

    /// Cash and card balances over every entry.
    pub async fn cash_balance(&self) -> CashBalance {
        ledger::compute_cash_balance(&self.cash_entries().await)
    }

    /// Expense totals by payment type inside `range`.
    pub async fn payment_summary(&self, range: &DateRange) -> LedgerResult<PaymentSummary> {
        range.validate()?;
        Ok(ledger::payment_summary(&self.cash_entries().await, range))
    }

    /// Dashboard figures.
    pub async fn overview(&self) -> Overview {
        let customers = self.customers().await;
        let entries = self.cash_entries().await;

        Overview {
            cash_balance: ledger::compute_cash_balance(&entries),
            total_customer_balance: customers.iter().map(|c| c.balance).sum(),
            customer_count: customers.len(),
            product_count: self.products().await.len(),
            invoice_count: self.invoices().await.len(),
            cash_entry_count: entries.len(),
            menu_item_count: self.menu_items().await.len(),
        }
    }
}

// =============================================================================
// Draft Validation
// =============================================================================

/// A complete, validated invoice line.
struct ValidLine {
    product_id: String,
    quantity: Decimal,
    unit_price: Money,
    discount_rate: Decimal,
    vat_rate: Decimal,
}

fn validate_lines(draft: &InvoiceDraft) -> Result<Vec<ValidLine>, ValidationError> {
    let mut lines = Vec::new();

    for line in draft.items.iter().filter(|l| l.is_complete()) {
        let (Some(product_id), Some(quantity), Some(unit_price)) =
            (line.product_id.as_deref(), line.quantity, line.unit_price)
        else {
            continue;
        };

        validate_quantity("quantity", quantity)?;
        validate_price("unitPrice", unit_price)?;
        validate_percentage("discountRate", line.discount_rate)?;

        lines.push(ValidLine {
            product_id: product_id.trim().to_string(),
            quantity,
            unit_price,
            discount_rate: line.discount_rate,
            vat_rate: line.vat_rate.unwrap_or(Decimal::from(DEFAULT_VAT_RATE)),
        });
    }

    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    Ok(lines)
}

// =============================================================================
// Unit Tests
// =============================================================================
