//! # Cart Engine
//!
//! The point-of-sale cart: a draft of desired sale quantities, built
//! against product snapshots and reconciled with live stock only at
//! checkout.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Lifecycle                                    │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌───────────────┐                   │
//! │  │  Empty   │────►│  Draft   │────►│   Checkout    │                   │
//! │  │  Cart    │     │          │     │  (reconciler) │                   │
//! │  └──────────┘     └──────────┘     └───────┬───────┘                   │
//! │                        │                   │                            │
//! │                   add_item            accepted lines leave the cart,   │
//! │                   set_quantity        rejected lines remain for the    │
//! │                   remove_item         cashier to adjust or drop        │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                     clear ────────────────► (back to empty)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart deliberately holds no lock on stock: it is a draft, not a
//! reservation. Each line remembers the stock ceiling seen when it was
//! built, and the checkout reconciler is the sole point where the draft
//! meets authoritative stock.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ReasonCode};
use crate::money::Money;
use crate::types::Product;
use crate::{DEFAULT_CUSTOMER, MAX_CART_LINES};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// Uses the snapshot pattern: name, price, store and the stock ceiling are
/// frozen from the product snapshot the line was built against. The price
/// the customer sees when the item enters the cart is the price charged at
/// checkout, even if the catalog changes in between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product identifier (SKU).
    pub product_id: String,

    /// Product name at the time of adding (frozen).
    pub name: String,

    /// Sale price per unit at the time of adding (frozen), whole rupiah.
    pub unit_sale_price: i64,

    /// Desired quantity; always `1..=stock_ceiling`.
    pub quantity: i64,

    /// Owning store at the time of adding (frozen).
    pub store_id: String,
    pub store_name: String,

    /// Live stock seen when the line was last touched by `add_item`.
    /// The cart never lets `quantity` exceed this.
    pub stock_ceiling: i64,
}

impl CartLine {
    /// Builds a line at quantity 1 from a product snapshot.
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_sale_price: product.sale_price,
            quantity: 1,
            store_id: product.store_id.clone(),
            store_name: product.store_name.clone(),
            stock_ceiling: product.stock,
        }
    }

    /// Line total: unit price × quantity, exact integer arithmetic.
    #[inline]
    pub fn total_price(&self) -> i64 {
        Money::from_units(self.unit_sale_price)
            .multiply_quantity(self.quantity)
            .units()
    }
}

// =============================================================================
// Quantity Update Outcome
// =============================================================================

/// What `set_quantity` actually did, so callers can tell the cashier when
/// a request was clamped instead of silently applying a different value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuantityUpdate {
    /// Desired quantity was below 1; the line was removed.
    Removed,
    /// The line now holds `quantity`; `clamped` is true when the desired
    /// value exceeded the stock ceiling and was reduced to it.
    Applied { quantity: i64, clamped: bool },
}

// =============================================================================
// Cart
// =============================================================================

/// The in-memory cart.
///
/// ## Invariants
/// - lines are unique by product id, kept in insertion order
/// - every line satisfies `1 <= quantity <= stock_ceiling`
/// - state changes only through the methods below; there is no background
///   refresh against the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in insertion order.
    pub lines: Vec<CartLine>,

    /// Customer name typed by the cashier; blank means a walk-in customer.
    pub customer: String,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// The customer name to record at checkout; blank falls back to the
    /// generic walk-in customer ("Umum").
    pub fn customer_name(&self) -> &str {
        let trimmed = self.customer.trim();
        if trimmed.is_empty() {
            DEFAULT_CUSTOMER
        } else {
            trimmed
        }
    }

    /// Looks up the line for a product, if any.
    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Adds one unit of a product, against the given registry snapshot.
    ///
    /// ## Behavior
    /// - snapshot stock 0 → `OutOfStock`
    /// - product not in cart → new line at quantity 1
    /// - product already in cart → quantity + 1, after refreshing the
    ///   line's ceiling from the snapshot; a line already at the ceiling
    ///   is left unchanged and rejected with `StockLimitReached`
    pub fn add_item(&mut self, product: &Product) -> CoreResult<()> {
        if !product.is_active {
            return Err(CoreError::ProductNotFound(product.id.clone()));
        }
        if product.stock == 0 {
            return Err(CoreError::OutOfStock(product.id.clone()));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.stock_ceiling = product.stock;
            if line.quantity >= line.stock_ceiling {
                return Err(CoreError::StockLimitReached {
                    product_id: product.id.clone(),
                    ceiling: line.stock_ceiling,
                });
            }
            line.quantity += 1;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartFull {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_product(product));
        Ok(())
    }

    /// Sets a line's quantity directly.
    ///
    /// ## Behavior
    /// - desired < 1 → the line is removed (implicit `remove_item`)
    /// - desired above the line's stock ceiling → clamped down to the
    ///   ceiling; the returned [`QuantityUpdate`] says so
    pub fn set_quantity(&mut self, product_id: &str, desired: i64) -> CoreResult<QuantityUpdate> {
        if desired < 1 {
            self.remove_item(product_id)?;
            return Ok(QuantityUpdate::Removed);
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        let clamped = desired > line.stock_ceiling;
        line.quantity = desired.min(line.stock_ceiling);

        Ok(QuantityUpdate::Applied {
            quantity: line.quantity,
            clamped,
        })
    }

    /// Removes a line by product id.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            return Err(CoreError::LineNotFound(product_id.to_string()));
        }
        Ok(())
    }

    /// Drops the lines whose product ids are in `product_ids`.
    ///
    /// Used by the checkout reconciler to clear accepted lines while
    /// leaving rejected ones in place.
    pub fn remove_lines(&mut self, product_ids: &[String]) {
        self.lines.retain(|l| !product_ids.contains(&l.product_id));
    }

    /// Clears all lines and the customer name.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer.clear();
    }

    /// Checks if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Subtotal and item count for the cart display.
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            subtotal: self.lines.iter().map(|l| l.total_price()).sum(),
            item_count: self.lines.iter().map(|l| l.quantity).sum(),
        }
    }
}

/// Cart totals for the UI: subtotal is the exact integer sum of line
/// totals, item count is the sum of line quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub subtotal: i64,
    pub item_count: i64,
}

// =============================================================================
// Checkout Result
// =============================================================================

/// One cart line the reconciler could not commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedLine {
    pub product_id: String,
    /// Machine-readable reason; the UI maps it to localized text.
    pub code: ReasonCode,
    /// Human-readable message for logs and fallback display.
    pub message: String,
}

/// Outcome of submitting a cart as one checkout batch.
///
/// Checkout is deliberately not all-or-nothing: earlier lines may commit
/// while later ones fail because concurrent sales depleted stock between
/// cart assembly and checkout. Accepted lines stand; nothing is rolled
/// back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutResult {
    /// Every line committed.
    AllAccepted {
        movement_ids: Vec<String>,
        /// Exact sum of the accepted lines' totals, whole rupiah.
        total_price: i64,
    },
    /// Some lines committed, some were rejected.
    PartiallyAccepted {
        accepted: Vec<String>,
        rejected: Vec<RejectedLine>,
        total_price: i64,
    },
    /// No line committed.
    AllRejected { rejected: Vec<RejectedLine> },
}

impl CheckoutResult {
    /// Classifies a batch outcome from the per-line results.
    pub fn from_lines(accepted: Vec<String>, rejected: Vec<RejectedLine>, total_price: i64) -> Self {
        if rejected.is_empty() {
            CheckoutResult::AllAccepted {
                movement_ids: accepted,
                total_price,
            }
        } else if accepted.is_empty() {
            CheckoutResult::AllRejected { rejected }
        } else {
            CheckoutResult::PartiallyAccepted {
                accepted,
                rejected,
                total_price,
            }
        }
    }

    /// Ids of the movements committed by this batch.
    pub fn accepted(&self) -> &[String] {
        match self {
            CheckoutResult::AllAccepted { movement_ids, .. } => movement_ids,
            CheckoutResult::PartiallyAccepted { accepted, .. } => accepted,
            CheckoutResult::AllRejected { .. } => &[],
        }
    }

    /// Lines that did not commit.
    pub fn rejected(&self) -> &[RejectedLine] {
        match self {
            CheckoutResult::AllAccepted { .. } => &[],
            CheckoutResult::PartiallyAccepted { rejected, .. } => rejected,
            CheckoutResult::AllRejected { rejected } => rejected,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, stock: i64, sale_price: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Produk {id}"),
            category: "ATK".to_string(),
            stock,
            min_stock: 2,
            purchase_price: sale_price / 2,
            sale_price,
            supplier: None,
            store_id: "TK-001".to_string(),
            store_name: "Toko Pusat".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_item_inserts_then_increments() {
        let mut cart = Cart::new();
        let p = product("SKU-001", 10, 3_000);

        cart.add_item(&p).unwrap();
        cart.add_item(&p).unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.line("SKU-001").unwrap().quantity, 2);
        assert_eq!(cart.summary().subtotal, 6_000);
        assert_eq!(cart.summary().item_count, 2);
    }

    #[test]
    fn test_add_item_rejects_zero_stock() {
        let mut cart = Cart::new();
        let err = cart.add_item(&product("SKU-001", 0, 3_000)).unwrap_err();
        assert_eq!(err.code(), ReasonCode::OutOfStock);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_item_stops_at_ceiling() {
        let mut cart = Cart::new();
        let p = product("SKU-001", 2, 3_000);

        cart.add_item(&p).unwrap();
        cart.add_item(&p).unwrap();
        let err = cart.add_item(&p).unwrap_err();

        assert_eq!(err.code(), ReasonCode::StockLimitReached);
        // quantity unchanged, never above the ceiling
        assert_eq!(cart.line("SKU-001").unwrap().quantity, 2);
    }

    #[test]
    fn test_add_item_refreshes_ceiling_from_snapshot() {
        let mut cart = Cart::new();
        cart.add_item(&product("SKU-001", 1, 3_000)).unwrap();

        // a fresh snapshot shows restocked shelves; the ceiling follows it
        cart.add_item(&product("SKU-001", 5, 3_000)).unwrap();
        let line = cart.line("SKU-001").unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.stock_ceiling, 5);
    }

    #[test]
    fn test_set_quantity_clamps_and_reports() {
        let mut cart = Cart::new();
        cart.add_item(&product("SKU-001", 10, 3_000)).unwrap();

        let update = cart.set_quantity("SKU-001", 15).unwrap();
        assert_eq!(
            update,
            QuantityUpdate::Applied {
                quantity: 10,
                clamped: true
            }
        );
        assert_eq!(cart.line("SKU-001").unwrap().quantity, 10);

        let update = cart.set_quantity("SKU-001", 4).unwrap();
        assert_eq!(
            update,
            QuantityUpdate::Applied {
                quantity: 4,
                clamped: false
            }
        );
    }

    #[test]
    fn test_set_quantity_below_one_removes() {
        let mut cart = Cart::new();
        cart.add_item(&product("SKU-001", 10, 3_000)).unwrap();

        let update = cart.set_quantity("SKU-001", 0).unwrap();
        assert_eq!(update, QuantityUpdate::Removed);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_unknown_line() {
        let mut cart = Cart::new();
        let err = cart.set_quantity("SKU-404", 2).unwrap_err();
        assert_eq!(err.code(), ReasonCode::NotFound);
    }

    #[test]
    fn test_price_frozen_at_add_time() {
        let mut cart = Cart::new();
        cart.add_item(&product("SKU-001", 10, 3_000)).unwrap();

        // catalog price rises after the line was built
        let repriced = product("SKU-001", 10, 5_000);
        cart.add_item(&repriced).unwrap();

        // the line keeps the price the customer saw first
        let line = cart.line("SKU-001").unwrap();
        assert_eq!(line.unit_sale_price, 3_000);
        assert_eq!(line.total_price(), 6_000);
    }

    #[test]
    fn test_customer_defaults_to_umum() {
        let mut cart = Cart::new();
        assert_eq!(cart.customer_name(), "Umum");

        cart.customer = "  ".to_string();
        assert_eq!(cart.customer_name(), "Umum");

        cart.customer = " Ibu Sari ".to_string();
        assert_eq!(cart.customer_name(), "Ibu Sari");
    }

    #[test]
    fn test_remove_lines_keeps_insertion_order() {
        let mut cart = Cart::new();
        cart.add_item(&product("SKU-001", 5, 1_000)).unwrap();
        cart.add_item(&product("SKU-002", 5, 2_000)).unwrap();
        cart.add_item(&product("SKU-003", 5, 3_000)).unwrap();

        cart.remove_lines(&["SKU-001".to_string(), "SKU-003".to_string()]);

        let ids: Vec<_> = cart.lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, ["SKU-002"]);
    }

    #[test]
    fn test_checkout_result_classification() {
        let rejected = RejectedLine {
            product_id: "SKU-002".to_string(),
            code: ReasonCode::InsufficientStock,
            message: "Insufficient stock".to_string(),
        };

        let all = CheckoutResult::from_lines(vec!["m1".into()], vec![], 9_000);
        assert!(matches!(all, CheckoutResult::AllAccepted { .. }));

        let partial =
            CheckoutResult::from_lines(vec!["m1".into()], vec![rejected.clone()], 9_000);
        assert!(matches!(partial, CheckoutResult::PartiallyAccepted { .. }));
        assert_eq!(partial.accepted(), ["m1".to_string()]);
        assert_eq!(partial.rejected().len(), 1);

        let none = CheckoutResult::from_lines(vec![], vec![rejected], 0);
        assert!(matches!(none, CheckoutResult::AllRejected { .. }));
        assert!(none.accepted().is_empty());
    }
}
