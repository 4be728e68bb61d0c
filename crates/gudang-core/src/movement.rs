//! # Stock Movements
//!
//! Movement records and requests: the only way product stock changes.
//!
//! ## The Tagged Union
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       StockMovement                                     │
//! │                                                                         │
//! │  common: id, product_id, store_id, quantity,                           │
//! │          stock_before, stock_after, created_by, created_at             │
//! │                                                                         │
//! │  detail (by direction):                                                 │
//! │    IN   incoming       supplier*, unit_purchase_price, notes           │
//! │    OUT  sale           customer_name*, unit_sale_price*, total_price   │
//! │    OUT  distribution   destination*, recipient, shipping_doc_number    │
//! │    OUT  internal_use   remark*                                          │
//! │    OUT  damaged        remark*                                          │
//! │    OUT  expired        remark*                                          │
//! │                                                                         │
//! │  (* = required, enforced by the validator)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The original dashboard discriminated these with a free-form `type`
//! string; here the subtype set is closed and every dispatch is an
//! exhaustive match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Direction
// =============================================================================

/// Whether a movement adds to or removes from stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementDirection {
    Incoming,
    Outgoing,
}

impl MovementDirection {
    /// Sign applied to the quantity when folding stock: +1 in, -1 out.
    #[inline]
    pub const fn signum(&self) -> i64 {
        match self {
            MovementDirection::Incoming => 1,
            MovementDirection::Outgoing => -1,
        }
    }
}

// =============================================================================
// Movement Detail (tagged union)
// =============================================================================

/// Subtype-specific fields of a committed movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementDetail {
    /// Goods received from a supplier.
    Incoming {
        supplier: String,
        /// Purchase price per unit at receipt time, in whole rupiah.
        unit_purchase_price: i64,
        #[serde(default)]
        notes: String,
    },

    /// A sale to a customer.
    Sale {
        customer_name: String,
        /// Sale price per unit actually charged, in whole rupiah.
        unit_sale_price: i64,
        /// Always `quantity * unit_sale_price`; stored so history totals
        /// survive later price changes.
        total_price: i64,
    },

    /// Goods shipped to another store or destination.
    Distribution {
        destination: String,
        #[serde(default)]
        recipient: String,
        #[serde(default)]
        shipping_doc_number: String,
    },

    /// Goods consumed internally.
    InternalUse { remark: String },

    /// Goods written off as damaged.
    Damaged { remark: String },

    /// Goods written off as expired.
    Expired { remark: String },
}

impl MovementDetail {
    /// The direction implied by the subtype.
    pub fn direction(&self) -> MovementDirection {
        match self {
            MovementDetail::Incoming { .. } => MovementDirection::Incoming,
            MovementDetail::Sale { .. }
            | MovementDetail::Distribution { .. }
            | MovementDetail::InternalUse { .. }
            | MovementDetail::Damaged { .. }
            | MovementDetail::Expired { .. } => MovementDirection::Outgoing,
        }
    }

    /// Stable label for persistence and logs; matches the serde tag.
    pub fn kind_label(&self) -> &'static str {
        match self {
            MovementDetail::Incoming { .. } => "incoming",
            MovementDetail::Sale { .. } => "sale",
            MovementDetail::Distribution { .. } => "distribution",
            MovementDetail::InternalUse { .. } => "internal_use",
            MovementDetail::Damaged { .. } => "damaged",
            MovementDetail::Expired { .. } => "expired",
        }
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// A committed, immutable change to a product's stock.
///
/// ## Invariants
/// - `quantity > 0`
/// - `stock_after = stock_before + delta()` and `stock_after >= 0`
/// - entries never change once appended to the ledger; corrections are new
///   compensating movements. Subtype metadata may be edited, but never the
///   quantity or the before/after snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Movement id (UUID v4). Also the idempotency key: replaying a commit
    /// with the same id is a no-op.
    pub id: String,

    /// Product this movement belongs to.
    pub product_id: String,

    /// Store the product belongs to, snapshotted at commit time.
    pub store_id: String,

    /// Units moved; always positive, direction comes from the detail.
    pub quantity: i64,

    /// Product stock immediately before this movement.
    pub stock_before: i64,

    /// Product stock immediately after this movement.
    pub stock_after: i64,

    /// Username of whoever recorded the movement.
    pub created_by: String,

    /// When the movement was committed.
    pub created_at: DateTime<Utc>,

    /// Subtype-specific fields.
    #[serde(flatten)]
    pub detail: MovementDetail,
}

impl StockMovement {
    /// The signed stock change this movement applies.
    ///
    /// ## Example
    /// ```rust
    /// use gudang_core::movement::{MovementDetail, StockMovement};
    /// use chrono::Utc;
    ///
    /// let m = StockMovement {
    ///     id: "m-1".into(),
    ///     product_id: "SKU-001".into(),
    ///     store_id: "TK-001".into(),
    ///     quantity: 4,
    ///     stock_before: 10,
    ///     stock_after: 6,
    ///     created_by: "admin".into(),
    ///     created_at: Utc::now(),
    ///     detail: MovementDetail::Damaged { remark: "jatuh dari rak".into() },
    /// };
    /// assert_eq!(m.delta(), -4);
    /// ```
    #[inline]
    pub fn delta(&self) -> i64 {
        self.detail.direction().signum() * self.quantity
    }

    /// The direction of this movement.
    #[inline]
    pub fn direction(&self) -> MovementDirection {
        self.detail.direction()
    }

    /// Total sale value, present only on sale movements.
    pub fn total_price(&self) -> Option<Money> {
        match &self.detail {
            MovementDetail::Sale { total_price, .. } => Some(Money::from_units(*total_price)),
            _ => None,
        }
    }
}

// =============================================================================
// Movement Request
// =============================================================================

/// A proposed movement, before validation.
///
/// The validator turns a request into a committed [`StockMovement`] by
/// checking the subtype rules against a product snapshot and computing the
/// before/after stock pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRequest {
    /// Units to move; must be positive.
    pub quantity: i64,

    /// Username of whoever is recording the movement.
    pub created_by: String,

    /// Subtype-specific request fields.
    #[serde(flatten)]
    pub detail: RequestDetail,
}

/// Subtype-specific fields of a movement request.
///
/// Mirrors [`MovementDetail`] minus derived fields: a sale request carries
/// no total (it is computed), and its unit price may be omitted to charge
/// the product's current sale price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestDetail {
    Incoming {
        supplier: String,
        unit_purchase_price: i64,
        #[serde(default)]
        notes: String,
    },
    Sale {
        customer_name: String,
        /// `None` charges the product's current sale price.
        #[serde(default)]
        unit_sale_price: Option<i64>,
    },
    Distribution {
        destination: String,
        #[serde(default)]
        recipient: String,
        #[serde(default)]
        shipping_doc_number: String,
    },
    InternalUse { remark: String },
    Damaged { remark: String },
    Expired { remark: String },
}

impl RequestDetail {
    /// The direction implied by the subtype.
    pub fn direction(&self) -> MovementDirection {
        match self {
            RequestDetail::Incoming { .. } => MovementDirection::Incoming,
            RequestDetail::Sale { .. }
            | RequestDetail::Distribution { .. }
            | RequestDetail::InternalUse { .. }
            | RequestDetail::Damaged { .. }
            | RequestDetail::Expired { .. } => MovementDirection::Outgoing,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(detail: MovementDetail, quantity: i64, before: i64) -> StockMovement {
        let delta = detail.direction().signum() * quantity;
        StockMovement {
            id: "test-movement".to_string(),
            product_id: "SKU-001".to_string(),
            store_id: "TK-001".to_string(),
            quantity,
            stock_before: before,
            stock_after: before + delta,
            created_by: "admin".to_string(),
            created_at: Utc::now(),
            detail,
        }
    }

    #[test]
    fn test_delta_signs() {
        let incoming = movement(
            MovementDetail::Incoming {
                supplier: "CV Sumber Jaya".into(),
                unit_purchase_price: 2_000,
                notes: String::new(),
            },
            10,
            5,
        );
        assert_eq!(incoming.delta(), 10);
        assert_eq!(incoming.stock_after, 15);

        let sale = movement(
            MovementDetail::Sale {
                customer_name: "Umum".into(),
                unit_sale_price: 3_000,
                total_price: 9_000,
            },
            3,
            15,
        );
        assert_eq!(sale.delta(), -3);
        assert_eq!(sale.stock_after, 12);
    }

    #[test]
    fn test_total_price_only_on_sales() {
        let sale = movement(
            MovementDetail::Sale {
                customer_name: "Budi".into(),
                unit_sale_price: 3_000,
                total_price: 9_000,
            },
            3,
            10,
        );
        assert_eq!(sale.total_price().unwrap().units(), 9_000);

        let damaged = movement(
            MovementDetail::Damaged {
                remark: "kardus penyok".into(),
            },
            1,
            10,
        );
        assert!(damaged.total_price().is_none());
    }

    #[test]
    fn test_kind_labels_match_serde_tags() {
        let detail = MovementDetail::InternalUse {
            remark: "pakai toko".into(),
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["type"], detail.kind_label());
    }

    #[test]
    fn test_movement_serialization_flattens_detail() {
        let sale = movement(
            MovementDetail::Sale {
                customer_name: "Budi".into(),
                unit_sale_price: 3_000,
                total_price: 9_000,
            },
            3,
            10,
        );
        let json = serde_json::to_value(&sale).unwrap();
        assert_eq!(json["type"], "sale");
        assert_eq!(json["customer_name"], "Budi");
        assert_eq!(json["stock_before"], 10);

        let back: StockMovement = serde_json::from_value(json).unwrap();
        assert_eq!(back, sale);
    }

    #[test]
    fn test_request_direction() {
        let req = RequestDetail::Distribution {
            destination: "Toko Cabang Bandung".into(),
            recipient: String::new(),
            shipping_doc_number: String::new(),
        };
        assert_eq!(req.direction(), MovementDirection::Outgoing);

        let req = RequestDetail::Incoming {
            supplier: "PT Maju".into(),
            unit_purchase_price: 1_500,
            notes: String::new(),
        };
        assert_eq!(req.direction(), MovementDirection::Incoming);
    }
}
