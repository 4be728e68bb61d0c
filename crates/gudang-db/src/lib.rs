//! # gudang-db: Ledger & Registry Persistence for Gudang POS
//!
//! This crate provides database access and write serialization for the
//! Gudang POS inventory system. It uses SQLite for local storage with sqlx
//! for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Gudang POS Data Flow                              │
//! │                                                                         │
//! │  StoreService (checkout, receipts, snapshots)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     gudang-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ MovementRepo  │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product registry and movement ledger repositories
//! - [`service`] - The StoreService: per-product write serialization and
//!   the checkout reconciler
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gudang_db::{Database, DbConfig, StoreService};
//!
//! let db = Database::new(DbConfig::new("path/to/gudang.db")).await?;
//! let service = StoreService::new(db);
//!
//! let snapshot = service.stock_snapshot("SKU-001").await?;
//! let result = service.checkout(&mut cart, "kasir1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};
pub use service::{IncomingOutcome, IncomingReceipt, ServiceError, StoreService};

// Repository re-exports for convenience
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
