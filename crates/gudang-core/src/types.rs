//! # Domain Types
//!
//! Product and stock status types used throughout Gudang POS.
//!
//! ## Identity
//! Products use a human-readable SKU (`SKU-001`, `SKU-002`, ...) as their
//! primary identifier. Stock movements use UUID v4 ids, which double as the
//! idempotency key for replay protection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::LOW_STOCK_BUFFER;

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its live stock level.
///
/// ## Invariants
/// - `stock >= 0` at all times
/// - `stock` is never written directly; it only changes by the signed delta
///   of an accepted [`StockMovement`](crate::movement::StockMovement)
/// - products referenced by movements are never hard-deleted, only
///   deactivated (`is_active = false`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Business identifier (SKU), unique across the catalog.
    pub id: String,

    /// Display name shown on the dashboard and in movement records.
    pub name: String,

    /// Product category (free text, defaults to "Lainnya").
    pub category: String,

    /// Current stock level. Derived state; see the struct invariants.
    pub stock: i64,

    /// Minimum-stock threshold used for the low-stock status.
    pub min_stock: i64,

    /// Purchase price per unit, in whole rupiah.
    pub purchase_price: i64,

    /// Sale price per unit, in whole rupiah.
    pub sale_price: i64,

    /// Most recent supplier, refreshed by incoming receipts.
    pub supplier: Option<String>,

    /// Owning store identifier.
    pub store_id: String,

    /// Owning store name, denormalized for display.
    pub store_name: String,

    /// Whether the product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated (stock or metadata).
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the purchase price as a Money type.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_units(self.purchase_price)
    }

    /// Returns the sale price as a Money type.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_units(self.sale_price)
    }

    /// Checks whether an outgoing movement of `quantity` units would keep
    /// stock non-negative.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Derives the reporting status from the current stock level.
    #[inline]
    pub fn status(&self) -> StockStatus {
        StockStatus::derive(self.stock, self.min_stock)
    }
}

// =============================================================================
// Stock Status
// =============================================================================

/// Derived stock status used by reporting; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Stock is zero.
    Out,
    /// Stock is positive but within `min_stock + LOW_STOCK_BUFFER`.
    Low,
    /// Stock is comfortably above the threshold.
    Available,
}

impl StockStatus {
    /// Derives the status for a stock level against a minimum threshold.
    ///
    /// ## Example
    /// ```rust
    /// use gudang_core::types::StockStatus;
    ///
    /// assert_eq!(StockStatus::derive(0, 2), StockStatus::Out);
    /// assert_eq!(StockStatus::derive(7, 2), StockStatus::Low);
    /// assert_eq!(StockStatus::derive(8, 2), StockStatus::Available);
    /// ```
    pub fn derive(stock: i64, min_stock: i64) -> Self {
        if stock == 0 {
            StockStatus::Out
        } else if stock <= min_stock + LOW_STOCK_BUFFER {
            StockStatus::Low
        } else {
            StockStatus::Available
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, min_stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "SKU-001".to_string(),
            name: "Pensil 2B".to_string(),
            category: "ATK".to_string(),
            stock,
            min_stock,
            purchase_price: 2_000,
            sale_price: 3_000,
            supplier: Some("CV Sumber Jaya".to_string()),
            store_id: "TK-001".to_string(),
            store_name: "Toko Pusat".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_thresholds() {
        // min_stock 2 → low band is 1..=7
        assert_eq!(product(0, 2).status(), StockStatus::Out);
        assert_eq!(product(1, 2).status(), StockStatus::Low);
        assert_eq!(product(7, 2).status(), StockStatus::Low);
        assert_eq!(product(8, 2).status(), StockStatus::Available);
    }

    #[test]
    fn test_zero_min_stock_still_has_buffer() {
        assert_eq!(product(5, 0).status(), StockStatus::Low);
        assert_eq!(product(6, 0).status(), StockStatus::Available);
    }

    #[test]
    fn test_can_fulfill() {
        let p = product(10, 2);
        assert!(p.can_fulfill(10));
        assert!(!p.can_fulfill(11));
    }

    #[test]
    fn test_price_accessors() {
        let p = product(10, 2);
        assert_eq!(p.sale_price().units(), 3_000);
        assert_eq!(p.purchase_price().units(), 2_000);
    }
}
