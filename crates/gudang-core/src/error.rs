//! # Error Types
//!
//! Domain-specific error types for gudang-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validation errors    bad input shape, recovered locally, never reach  │
//! │                       the ledger (ValidationError)                     │
//! │  business-rule errors InsufficientStock, StockLimitReached - expected, │
//! │                       reported to the caller, not logged as failures   │
//! │  not-found errors     stale product reference - surfaced, not retried  │
//! │                                                                         │
//! │  Concurrency (Busy) and ledger-divergence errors live in gudang-db;    │
//! │  they cannot arise in pure code.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, available vs requested)
//! 3. Errors are enum variants, never String
//! 4. Every rejection maps to a machine-readable [`ReasonCode`]

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Reason Codes
// =============================================================================

/// Machine-readable rejection codes surfaced to the UI layer.
///
/// The dashboard maps these to localized text; the strings in the error
/// messages below are for logs and debugging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Quantity was zero or negative.
    InvalidQuantity,
    /// A subtype-required field was blank.
    MissingRequiredField,
    /// Outgoing quantity exceeded live stock.
    InsufficientStock,
    /// Cart line already at the known stock ceiling.
    StockLimitReached,
    /// Product had zero stock when added to the cart.
    OutOfStock,
    /// Product (or cart line) does not exist.
    NotFound,
    /// Per-product write section could not be acquired in time; retryable.
    Busy,
    /// Unexpected internal failure.
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found (stale reference, soft-deleted, or typo).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Quantity must be a positive whole number.
    #[error("Invalid quantity: {got} (must be greater than 0)")]
    InvalidQuantity { got: i64 },

    /// A field required by the movement subtype was blank.
    ///
    /// Customer name for sales, destination for distributions, remark for
    /// internal use / damaged / expired, supplier for incoming receipts.
    #[error("{field} is required")]
    MissingRequiredField { field: &'static str },

    /// Insufficient stock to complete an outgoing movement.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Product has zero stock and cannot be added to a cart.
    #[error("Product {0} is out of stock")]
    OutOfStock(String),

    /// Cart line quantity already equals the stock ceiling known at
    /// cart-build time; the quantity is left unchanged.
    #[error("Cart line for {product_id} already at stock ceiling ({ceiling})")]
    StockLimitReached { product_id: String, ceiling: i64 },

    /// Cart operation referenced a product that has no line.
    #[error("Product {0} is not in the cart")]
    LineNotFound(String),

    /// Cart has reached the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} lines")]
    CartFull { max: usize },

    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the machine-readable code for this error.
    pub fn code(&self) -> ReasonCode {
        match self {
            CoreError::ProductNotFound(_) | CoreError::LineNotFound(_) => ReasonCode::NotFound,
            CoreError::InvalidQuantity { .. } => ReasonCode::InvalidQuantity,
            CoreError::MissingRequiredField { .. } => ReasonCode::MissingRequiredField,
            CoreError::InsufficientStock { .. } => ReasonCode::InsufficientStock,
            CoreError::OutOfStock(_) => ReasonCode::OutOfStock,
            CoreError::StockLimitReached { .. } => ReasonCode::StockLimitReached,
            CoreError::CartFull { .. } => ReasonCode::InvalidQuantity,
            CoreError::Validation(e) => e.code(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet shape requirements and are
/// rejected before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Monetary or stock value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
}

impl ValidationError {
    /// Returns the machine-readable code for this error.
    pub fn code(&self) -> ReasonCode {
        match self {
            ValidationError::Required { .. } => ReasonCode::MissingRequiredField,
            ValidationError::TooLong { .. } => ReasonCode::Internal,
            ValidationError::Negative { .. } => ReasonCode::InvalidQuantity,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
