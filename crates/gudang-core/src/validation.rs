//! # Validation Module
//!
//! The stock movement validator and input validators.
//!
//! ## Validator Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate(product, request) → Result<StockMovement, CoreError>          │
//! │                                                                         │
//! │  1. quantity > 0                 else InvalidQuantity                   │
//! │  2. subtype-required fields      else MissingRequiredField              │
//! │  3. OUT: quantity <= stock       else InsufficientStock                 │
//! │  4. compute stock_before/after, assign id + timestamp                   │
//! │                                                                         │
//! │  No side effects: the caller owns the commit. The stock check and the  │
//! │  commit must run inside one per-product exclusive section so no other  │
//! │  movement can act on a stale stock value in between.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::movement::{
    MovementDetail, MovementDirection, MovementRequest, RequestDetail, StockMovement,
};
use crate::types::Product;

// =============================================================================
// The Stock Movement Validator
// =============================================================================

/// Validates a movement request against a product snapshot and, on success,
/// returns the committed-form [`StockMovement`] with before/after stock
/// computed and id/timestamp assigned.
///
/// Purely computes the proposed record; persisting it and mutating the
/// product is the caller's job, under the product's exclusive section.
pub fn validate(product: &Product, request: &MovementRequest) -> CoreResult<StockMovement> {
    if !product.is_active {
        return Err(CoreError::ProductNotFound(product.id.clone()));
    }

    if request.quantity <= 0 {
        return Err(CoreError::InvalidQuantity {
            got: request.quantity,
        });
    }

    let detail = validate_detail(product, &request.detail, request.quantity)?;

    if detail.direction() == MovementDirection::Outgoing && !product.can_fulfill(request.quantity) {
        return Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.stock,
            requested: request.quantity,
        });
    }

    let stock_before = product.stock;
    let stock_after = stock_before + detail.direction().signum() * request.quantity;

    Ok(StockMovement {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        store_id: product.store_id.clone(),
        quantity: request.quantity,
        stock_before,
        stock_after,
        created_by: request.created_by.clone(),
        created_at: Utc::now(),
        detail,
    })
}

/// Checks subtype-required fields and resolves derived ones.
fn validate_detail(
    product: &Product,
    detail: &RequestDetail,
    quantity: i64,
) -> CoreResult<MovementDetail> {
    match detail {
        RequestDetail::Incoming {
            supplier,
            unit_purchase_price,
            notes,
        } => Ok(MovementDetail::Incoming {
            supplier: require_text(supplier, "supplier")?,
            unit_purchase_price: *unit_purchase_price,
            notes: notes.trim().to_string(),
        }),

        RequestDetail::Sale {
            customer_name,
            unit_sale_price,
        } => {
            let customer_name = require_text(customer_name, "customer name")?;

            // An omitted price charges the product's current sale price;
            // either way the charged price must be positive.
            let unit_sale_price = unit_sale_price.unwrap_or(product.sale_price);
            if unit_sale_price <= 0 {
                return Err(CoreError::MissingRequiredField {
                    field: "unit sale price",
                });
            }

            let total_price = Money::from_units(unit_sale_price).multiply_quantity(quantity);

            Ok(MovementDetail::Sale {
                customer_name,
                unit_sale_price,
                total_price: total_price.units(),
            })
        }

        RequestDetail::Distribution {
            destination,
            recipient,
            shipping_doc_number,
        } => Ok(MovementDetail::Distribution {
            destination: require_text(destination, "destination")?,
            recipient: recipient.trim().to_string(),
            shipping_doc_number: shipping_doc_number.trim().to_string(),
        }),

        RequestDetail::InternalUse { remark } => Ok(MovementDetail::InternalUse {
            remark: require_text(remark, "remark")?,
        }),

        RequestDetail::Damaged { remark } => Ok(MovementDetail::Damaged {
            remark: require_text(remark, "remark")?,
        }),

        RequestDetail::Expired { remark } => Ok(MovementDetail::Expired {
            remark: require_text(remark, "remark")?,
        }),
    }
}

/// Validates the subtype-required fields of an already-committed movement's
/// metadata, for metadata-only edits.
///
/// Edits may change who a sale was to or what a remark says, but never the
/// quantity or the stock snapshots; the caller enforces that by only
/// accepting a [`MovementDetail`] of the same subtype.
pub fn validate_metadata(detail: &MovementDetail) -> CoreResult<()> {
    match detail {
        MovementDetail::Incoming { supplier, .. } => {
            require_text(supplier, "supplier")?;
        }
        MovementDetail::Sale {
            customer_name,
            unit_sale_price,
            ..
        } => {
            require_text(customer_name, "customer name")?;
            if *unit_sale_price <= 0 {
                return Err(CoreError::MissingRequiredField {
                    field: "unit sale price",
                });
            }
        }
        MovementDetail::Distribution { destination, .. } => {
            require_text(destination, "destination")?;
        }
        MovementDetail::InternalUse { remark }
        | MovementDetail::Damaged { remark }
        | MovementDetail::Expired { remark } => {
            require_text(remark, "remark")?;
        }
    }
    Ok(())
}

/// Trims a required text field, rejecting blank values.
fn require_text(value: &str, field: &'static str) -> CoreResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::MissingRequiredField { field });
    }
    Ok(value.to_string())
}

// =============================================================================
// Input Validators
// =============================================================================

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product name: non-blank, at most 200 characters.
/// Returns the trimmed name.
pub fn validate_product_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required { field: "name" });
    }
    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name",
            max: 200,
        });
    }

    Ok(name.to_string())
}

/// Validates a price in whole rupiah: zero allowed, negative rejected.
pub fn validate_price(field: &'static str, units: i64) -> ValidationResult<()> {
    if units < 0 {
        return Err(ValidationError::Negative { field });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
