//! # gudang-core: Pure Business Logic for Gudang POS
//!
//! This crate is the heart of the Gudang POS inventory system. It contains
//! the stock ledger and cart business rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gudang POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Dashboard UI (external)                        │   │
//! │  │    Catalog ──► Barang Masuk ──► Barang Keluar ──► Kasir        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               gudang-db (StoreService)                          │   │
//! │  │    stock snapshots, movement commits, checkout batches         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gudang-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ movement  │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │ StockMov. │  │   Cart    │  │   rules   │  │   │
//! │  │   │  Status   │  │  Request  │  │ CartLine  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product and stock status types
//! - [`movement`] - Stock movement records and requests
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - The point-of-sale cart engine
//! - [`validation`] - The stock movement validator
//! - [`error`] - Domain error types and reason codes
//!
//! ## Design Principles
//!
//! 1. **Stock is derived**: product stock only changes through an accepted
//!    movement's delta, never by direct assignment
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are integer rupiah (i64)
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod movement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use gudang_core::Money` instead of
// `use gudang_core::money::Money`

pub use cart::{Cart, CartLine, CartSummary, CheckoutResult, QuantityUpdate, RejectedLine};
pub use error::{CoreError, ReasonCode, ValidationError};
pub use money::Money;
pub use movement::{MovementDetail, MovementDirection, MovementRequest, RequestDetail, StockMovement};
pub use types::{Product, StockStatus};

// =============================================================================
// Crate-Level Business Constants
// =============================================================================

/// Extra units above `min_stock` that still count as "low" stock.
///
/// A product with `0 < stock <= min_stock + LOW_STOCK_BUFFER` shows as low
/// on the dashboard. The buffer is a fixed business constant, not
/// configurable per product.
pub const LOW_STOCK_BUFFER: i64 = 5;

/// Minimum-stock threshold assigned to products created by an incoming
/// receipt (catalog management may set a different value later).
pub const DEFAULT_MIN_STOCK: i64 = 5;

/// Category assigned to products created by an incoming receipt.
pub const DEFAULT_CATEGORY: &str = "Lainnya";

/// Customer name recorded for walk-in sales when the cashier leaves the
/// field blank.
pub const DEFAULT_CUSTOMER: &str = "Umum";

/// Maximum distinct lines allowed in a single cart.
///
/// Prevents runaway carts and keeps checkout batches a reasonable size.
pub const MAX_CART_LINES: usize = 100;
