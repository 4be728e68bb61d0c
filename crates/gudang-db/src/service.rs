//! # Store Service
//!
//! The seam the dashboard UI talks to: stock snapshots, movement commits,
//! incoming receipts and the checkout reconciler, with per-product write
//! serialization.
//!
//! ## Write Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              One logical writer per product at a time                   │
//! │                                                                         │
//! │  checkout line / movement request                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  acquire per-product mutex (bounded by lock_timeout ──► Busy)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load product ──► validate against CURRENT stock ──► commit (one tx)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  release                                                                │
//! │                                                                         │
//! │  The stock check and the commit happen inside the same exclusive       │
//! │  section, so two concurrent sales can never both pass the check on     │
//! │  the last unit. Movements on different products run fully in parallel.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Integrity Halt
//! [`verify_integrity`](StoreService::verify_integrity) folds a product's
//! ledger and compares it with the registry. On divergence - the one fatal
//! condition in this system - the product goes into the halted set and all
//! further writes to it are refused until a re-verification passes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::DbError;
use crate::pool::Database;
use gudang_core::{
    validation, Cart, CheckoutResult, CoreError, MovementDetail, MovementRequest, Product,
    ReasonCode, RejectedLine, RequestDetail, StockMovement, DEFAULT_CATEGORY, DEFAULT_MIN_STOCK,
};

/// How long a writer waits for a product's exclusive section before the
/// operation is reported as `Busy` instead of blocking the batch.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

// =============================================================================
// Service Error
// =============================================================================

/// Errors surfaced by [`StoreService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business-rule or validation rejection from gudang-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The per-product exclusive section could not be acquired within the
    /// lock timeout. Retryable by the caller.
    #[error("Timed out waiting for exclusive access to product {0}")]
    Busy(String),

    /// Writes to this product are halted after a detected ledger/registry
    /// divergence; run `verify_integrity` once the data is reconciled.
    #[error("Writes are halted for product {0} pending ledger reconciliation")]
    WritesHalted(String),

    /// Checkout was called on a cart with no lines.
    #[error("Cart is empty")]
    EmptyCart,
}

impl ServiceError {
    /// Machine-readable code for the UI layer.
    pub fn code(&self) -> ReasonCode {
        match self {
            ServiceError::Core(e) => e.code(),
            ServiceError::Db(DbError::NotFound { .. }) => ReasonCode::NotFound,
            ServiceError::Db(_) => ReasonCode::Internal,
            ServiceError::Busy(_) => ReasonCode::Busy,
            ServiceError::WritesHalted(_) => ReasonCode::Internal,
            ServiceError::EmptyCart => ReasonCode::InvalidQuantity,
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// DTOs
// =============================================================================

/// An incoming goods receipt, keyed by store and product *name* so that
/// first-time products can be created on the fly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingReceipt {
    pub store_id: String,
    pub store_name: String,
    /// Product name; matched case-insensitively within the store.
    pub name: String,
    pub supplier: String,
    pub quantity: i64,
    /// Purchase price per unit, whole rupiah.
    pub unit_purchase_price: i64,
    #[serde(default)]
    pub notes: String,
    pub created_by: String,
}

/// Result of an incoming receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingOutcome {
    pub movement: StockMovement,
    /// Product state after the receipt.
    pub product: Product,
    /// True when the receipt created the product (first delivery).
    pub created_product: bool,
}

// =============================================================================
// Per-Product Lock Table
// =============================================================================

/// Lazily created async mutexes, one per key (product id, or a synthetic
/// creation key for products that don't exist yet).
#[derive(Debug, Default)]
struct ProductLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ProductLocks {
    fn for_key(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().expect("lock table poisoned");
        map.entry(key.to_string()).or_default().clone()
    }
}

// =============================================================================
// Store Service
// =============================================================================

/// The inventory service behind the dashboard's JSON layer.
///
/// Owns the database handle, the per-product lock table and the set of
/// integrity-halted products. Cheap operations (snapshots, history) go
/// straight to the repositories; anything that writes stock goes through
/// a per-product exclusive section.
#[derive(Debug)]
pub struct StoreService {
    db: Database,
    locks: ProductLocks,
    halted: Mutex<HashSet<String>>,
    lock_timeout: Duration,
}

impl StoreService {
    /// Creates a service over an initialized database.
    pub fn new(db: Database) -> Self {
        StoreService {
            db,
            locks: ProductLocks::default(),
            halted: Mutex::new(HashSet::new()),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Overrides the lock-acquisition timeout (mainly for tests).
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Current product state, including live stock.
    pub async fn stock_snapshot(&self, product_id: &str) -> ServiceResult<Product> {
        let product = self
            .db
            .products()
            .get(product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;
        Ok(product)
    }

    /// A page of a product's movement history, oldest first.
    pub async fn ledger(
        &self,
        product_id: &str,
        page: u32,
        per_page: u32,
    ) -> ServiceResult<Vec<StockMovement>> {
        // surface a stale reference instead of an empty history
        self.stock_snapshot(product_id).await?;

        let history = self.db.movements().history(product_id, page, per_page).await?;
        Ok(history)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Records a movement (incoming or outgoing) against an existing
    /// product, under its exclusive section.
    pub async fn record_movement(
        &self,
        product_id: &str,
        request: MovementRequest,
    ) -> ServiceResult<StockMovement> {
        let (movement, _product) = self.record_movement_inner(product_id, request).await?;
        Ok(movement)
    }

    /// Records an incoming goods receipt.
    ///
    /// A receipt for a product name unknown to the store creates the
    /// product first (generated SKU, default min-stock, no sale price yet);
    /// its opening stock then arrives through the committed movement, so
    /// the ledger explains every unit from day one. A known name restocks
    /// the existing product and refreshes its supplier and purchase price.
    pub async fn receive_stock(&self, receipt: IncomingReceipt) -> ServiceResult<IncomingOutcome> {
        if receipt.quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                got: receipt.quantity,
            }
            .into());
        }
        if receipt.store_id.trim().is_empty() {
            return Err(CoreError::MissingRequiredField { field: "store id" }.into());
        }
        if receipt.supplier.trim().is_empty() {
            return Err(CoreError::MissingRequiredField { field: "supplier" }.into());
        }
        let name = validation::validate_product_name(&receipt.name).map_err(CoreError::from)?;
        validation::validate_price("purchase price", receipt.unit_purchase_price)
            .map_err(CoreError::from)?;

        let request = MovementRequest {
            quantity: receipt.quantity,
            created_by: receipt.created_by.clone(),
            detail: RequestDetail::Incoming {
                supplier: receipt.supplier.clone(),
                unit_purchase_price: receipt.unit_purchase_price,
                notes: receipt.notes.clone(),
            },
        };

        // Restock path: the product already exists
        if let Some(existing) = self
            .db
            .products()
            .find_by_name(&receipt.store_id, &name)
            .await?
        {
            let (movement, product) = self.record_movement_inner(&existing.id, request).await?;
            return Ok(IncomingOutcome {
                movement,
                product,
                created_product: false,
            });
        }

        // Creation path: serialize on a synthetic key so two first
        // deliveries of the same name cannot both create the product
        let create_key = format!("create:{}:{}", receipt.store_id, name.to_lowercase());
        let _guard = self.acquire(&create_key).await?;

        if let Some(existing) = self
            .db
            .products()
            .find_by_name(&receipt.store_id, &name)
            .await?
        {
            // lost the race; fall back to restocking
            let (movement, product) = self.record_movement_inner(&existing.id, request).await?;
            return Ok(IncomingOutcome {
                movement,
                product,
                created_product: false,
            });
        }

        let now = Utc::now();
        let product = Product {
            id: self.db.products().next_sku().await?,
            name,
            category: DEFAULT_CATEGORY.to_string(),
            stock: 0,
            min_stock: DEFAULT_MIN_STOCK,
            purchase_price: receipt.unit_purchase_price,
            sale_price: 0,
            supplier: Some(receipt.supplier.clone()),
            store_id: receipt.store_id.clone(),
            store_name: receipt.store_name.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.db.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, "Product created by incoming receipt");

        let (movement, product) = self.record_movement_inner(&product.id, request).await?;
        Ok(IncomingOutcome {
            movement,
            product,
            created_product: true,
        })
    }

    /// Submits a cart as one checkout batch.
    ///
    /// Lines are processed in the cart's insertion order, each as an
    /// independent sale movement validated against the *current* product
    /// state - not the cart's snapshot. Accepted lines commit immediately
    /// and leave the cart; rejected lines stay in the cart, each reported
    /// with a reason code. Nothing is rolled back and nothing is retried.
    pub async fn checkout(
        &self,
        cart: &mut Cart,
        created_by: &str,
    ) -> ServiceResult<CheckoutResult> {
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }

        let customer = cart.customer_name().to_string();
        let lines = cart.lines.clone();

        let mut accepted_ids = Vec::new();
        let mut accepted_products = Vec::new();
        let mut rejected = Vec::new();
        // exact integer sum of accepted line totals, never recomputed
        let mut total_price: i64 = 0;

        for line in &lines {
            let request = MovementRequest {
                quantity: line.quantity,
                created_by: created_by.to_string(),
                detail: RequestDetail::Sale {
                    customer_name: customer.clone(),
                    // charge the price frozen in the cart line
                    unit_sale_price: Some(line.unit_sale_price),
                },
            };

            match self.record_movement_inner(&line.product_id, request).await {
                Ok((movement, _product)) => {
                    if let MovementDetail::Sale { total_price: t, .. } = movement.detail {
                        total_price += t;
                    }
                    accepted_ids.push(movement.id);
                    accepted_products.push(line.product_id.clone());
                }
                Err(err) => {
                    debug!(product_id = %line.product_id, error = %err, "Checkout line rejected");
                    rejected.push(RejectedLine {
                        product_id: line.product_id.clone(),
                        code: err.code(),
                        message: err.to_string(),
                    });
                }
            }
        }

        // accepted lines leave the cart; rejected lines stay for the
        // cashier to adjust or remove
        cart.remove_lines(&accepted_products);

        info!(
            accepted = accepted_ids.len(),
            rejected = rejected.len(),
            total_price,
            customer = %customer,
            "Checkout batch processed"
        );

        Ok(CheckoutResult::from_lines(accepted_ids, rejected, total_price))
    }

    /// Edits a committed movement's subtype metadata.
    ///
    /// Never touches quantity or the stock snapshots; those corrections are
    /// new compensating movements.
    pub async fn update_movement_metadata(
        &self,
        movement_id: &str,
        detail: &MovementDetail,
    ) -> ServiceResult<StockMovement> {
        validation::validate_metadata(detail)?;
        let movement = self.db.movements().update_metadata(movement_id, detail).await?;
        Ok(movement)
    }

    // -------------------------------------------------------------------------
    // Integrity
    // -------------------------------------------------------------------------

    /// Checks the round-trip law for one product: folding its full ledger
    /// must reproduce the registry's current stock.
    ///
    /// On divergence the product is halted (all writes refused) and the
    /// error carries both numbers; a later verification that passes lifts
    /// the halt.
    pub async fn verify_integrity(&self, product_id: &str) -> ServiceResult<()> {
        let _guard = self.acquire(product_id).await?;

        let product = self.stock_snapshot(product_id).await?;
        let folded = self.db.movements().fold_stock(product_id).await?;

        if folded != product.stock {
            warn!(
                product_id = %product_id,
                ledger_stock = folded,
                registry_stock = product.stock,
                "Ledger/registry divergence detected; halting writes"
            );
            self.set_halted(product_id, true);
            return Err(DbError::IntegrityViolation {
                product_id: product_id.to_string(),
                ledger_stock: folded,
                registry_stock: product.stock,
            }
            .into());
        }

        self.set_halted(product_id, false);
        Ok(())
    }

    /// Whether writes to a product are currently halted.
    pub fn is_halted(&self, product_id: &str) -> bool {
        self.halted
            .lock()
            .expect("halted set poisoned")
            .contains(product_id)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// The exclusive check-then-commit section shared by every write path.
    async fn record_movement_inner(
        &self,
        product_id: &str,
        request: MovementRequest,
    ) -> ServiceResult<(StockMovement, Product)> {
        if self.is_halted(product_id) {
            return Err(ServiceError::WritesHalted(product_id.to_string()));
        }

        let _guard = self.acquire(product_id).await?;

        let product = self.stock_snapshot(product_id).await?;
        let movement = validation::validate(&product, &request)?;

        let product = match self.db.movements().commit(&movement).await {
            Ok(product) => product,
            Err(err @ DbError::IntegrityViolation { .. }) => {
                self.set_halted(product_id, true);
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        // incoming receipts refresh the catalog's supply metadata
        if let MovementDetail::Incoming {
            supplier,
            unit_purchase_price,
            ..
        } = &movement.detail
        {
            self.db
                .products()
                .update_supply_info(product_id, supplier, *unit_purchase_price)
                .await?;
        }

        info!(
            movement_id = %movement.id,
            product_id = %product_id,
            kind = movement.detail.kind_label(),
            quantity = movement.quantity,
            stock_after = movement.stock_after,
            "Movement committed"
        );

        Ok((movement, product))
    }

    async fn acquire(&self, key: &str) -> Result<OwnedMutexGuard<()>, ServiceError> {
        let lock = self.locks.for_key(key);
        timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| ServiceError::Busy(key.to_string()))
    }

    fn set_halted(&self, product_id: &str, halted: bool) {
        let mut set = self.halted.lock().expect("halted set poisoned");
        if halted {
            set.insert(product_id.to_string());
        } else {
            set.remove(product_id);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use gudang_core::{CheckoutResult, StockStatus};

    async fn service() -> StoreService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        StoreService::new(db).with_lock_timeout(Duration::from_millis(100))
    }

    fn catalog_product(id: &str, stock: i64, sale_price: i64) -> Product {
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

    /// Inserts a catalog product and backfills its opening stock through an
    /// incoming movement so the ledger fold matches from the start.
    async fn seed_product(svc: &StoreService, id: &str, stock: i64, sale_price: i64) -> Product {
        let p = catalog_product(id, 0, sale_price);
        svc.db.products().insert(&p).await.unwrap();
        if stock > 0 {
            svc.record_movement(
                id,
                MovementRequest {
                    quantity: stock,
                    created_by: "admin".to_string(),
                    detail: RequestDetail::Incoming {
                        supplier: "CV Sumber Jaya".to_string(),
                        unit_purchase_price: sale_price / 2,
                        notes: String::new(),
                    },
                },
            )
            .await
            .unwrap();
        }
        svc.stock_snapshot(id).await.unwrap()
    }

    fn damaged(quantity: i64) -> MovementRequest {
        MovementRequest {
            quantity,
            created_by: "admin".to_string(),
            detail: RequestDetail::Damaged {
                remark: "rusak di gudang".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_checkout_all_accepted_clears_cart() {
        let svc = service().await;
        let a = seed_product(&svc, "SKU-001", 5, 3_000).await;
        let b = seed_product(&svc, "SKU-002", 4, 7_000).await;

        let mut cart = Cart::new();
        cart.add_item(&a).unwrap();
        cart.add_item(&a).unwrap();
        cart.add_item(&b).unwrap();

        let result = svc.checkout(&mut cart, "kasir1").await.unwrap();

        match &result {
            CheckoutResult::AllAccepted {
                movement_ids,
                total_price,
            } => {
                assert_eq!(movement_ids.len(), 2);
                // 2 × 3000 + 1 × 7000, exact integer sum
                assert_eq!(*total_price, 13_000);
            }
            other => panic!("expected AllAccepted, got {other:?}"),
        }

        assert!(cart.is_empty());
        assert_eq!(svc.stock_snapshot("SKU-001").await.unwrap().stock, 3);
        assert_eq!(svc.stock_snapshot("SKU-002").await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_checkout_partial_on_concurrent_depletion() {
        let svc = service().await;
        let a = seed_product(&svc, "SKU-001", 5, 3_000).await;
        let b = seed_product(&svc, "SKU-002", 3, 7_000).await;

        let mut cart = Cart::new();
        cart.add_item(&a).unwrap(); // A ×1
        cart.add_item(&b).unwrap();
        cart.set_quantity("SKU-002", 2).unwrap(); // B ×2

        // another terminal wipes out B between cart build and checkout
        svc.record_movement("SKU-002", damaged(3)).await.unwrap();

        let result = svc.checkout(&mut cart, "kasir1").await.unwrap();

        match &result {
            CheckoutResult::PartiallyAccepted {
                accepted,
                rejected,
                total_price,
            } => {
                assert_eq!(accepted.len(), 1);
                assert_eq!(rejected.len(), 1);
                assert_eq!(rejected[0].product_id, "SKU-002");
                assert_eq!(rejected[0].code, ReasonCode::InsufficientStock);
                assert_eq!(*total_price, 3_000);
            }
            other => panic!("expected PartiallyAccepted, got {other:?}"),
        }

        // A committed exactly once, B untouched by the batch
        assert_eq!(svc.stock_snapshot("SKU-001").await.unwrap().stock, 4);
        assert_eq!(svc.stock_snapshot("SKU-002").await.unwrap().stock, 0);

        // the rejected line stays in the cart for the cashier
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].product_id, "SKU-002");
    }

    #[tokio::test]
    async fn test_checkout_clamped_sale_drains_stock_to_out() {
        let svc = service().await;
        let p = seed_product(&svc, "SKU-001", 10, 3_000).await;
        assert_eq!(p.min_stock, 2);

        let mut cart = Cart::new();
        cart.add_item(&p).unwrap();
        let update = cart.set_quantity("SKU-001", 15).unwrap();
        assert_eq!(
            update,
            gudang_core::QuantityUpdate::Applied {
                quantity: 10,
                clamped: true
            }
        );

        let result = svc.checkout(&mut cart, "kasir1").await.unwrap();
        assert!(matches!(result, CheckoutResult::AllAccepted { .. }));

        let after = svc.stock_snapshot("SKU-001").await.unwrap();
        assert_eq!(after.stock, 0);
        assert_eq!(after.status(), StockStatus::Out);
    }

    #[tokio::test]
    async fn test_checkout_busy_line_is_rejected_not_hung() {
        let svc = service().await;
        let p = seed_product(&svc, "SKU-001", 5, 3_000).await;

        let mut cart = Cart::new();
        cart.add_item(&p).unwrap();

        // someone is sitting on the product's exclusive section
        let lock = svc.locks.for_key("SKU-001");
        let _held = lock.lock().await;

        let result = svc.checkout(&mut cart, "kasir1").await.unwrap();

        match &result {
            CheckoutResult::AllRejected { rejected } => {
                assert_eq!(rejected[0].code, ReasonCode::Busy);
            }
            other => panic!("expected AllRejected, got {other:?}"),
        }
        // the busy line is retryable and still in the cart
        assert_eq!(cart.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let svc = service().await;
        let mut cart = Cart::new();
        let err = svc.checkout(&mut cart, "kasir1").await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyCart));
    }

    #[tokio::test]
    async fn test_checkout_uses_default_customer() {
        let svc = service().await;
        let p = seed_product(&svc, "SKU-001", 5, 3_000).await;

        let mut cart = Cart::new();
        cart.add_item(&p).unwrap();
        let result = svc.checkout(&mut cart, "kasir1").await.unwrap();

        let movement = svc
            .db
            .movements()
            .get(&result.accepted()[0])
            .await
            .unwrap()
            .unwrap();
        match movement.detail {
            MovementDetail::Sale { customer_name, .. } => assert_eq!(customer_name, "Umum"),
            other => panic!("expected sale detail, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_receive_stock_creates_then_restocks() {
        let svc = service().await;

        let first = svc
            .receive_stock(IncomingReceipt {
                store_id: "TK-001".to_string(),
                store_name: "Toko Pusat".to_string(),
                name: "Pensil 2B".to_string(),
                supplier: "CV Sumber Jaya".to_string(),
                quantity: 25,
                unit_purchase_price: 2_000,
                notes: String::new(),
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        assert!(first.created_product);
        assert_eq!(first.product.id, "SKU-001");
        assert_eq!(first.product.stock, 25);
        assert_eq!(first.product.min_stock, DEFAULT_MIN_STOCK);
        assert_eq!(first.movement.stock_before, 0);
        assert_eq!(first.movement.stock_after, 25);

        // same name, different case: restocks instead of creating
        let second = svc
            .receive_stock(IncomingReceipt {
                store_id: "TK-001".to_string(),
                store_name: "Toko Pusat".to_string(),
                name: "pensil 2b".to_string(),
                supplier: "PT Maju Bersama".to_string(),
                quantity: 15,
                unit_purchase_price: 2_200,
                notes: "harga naik".to_string(),
                created_by: "admin".to_string(),
            })
            .await
            .unwrap();

        assert!(!second.created_product);
        assert_eq!(second.product.id, "SKU-001");
        assert_eq!(second.product.stock, 40);

        // supply metadata refreshed by the restock
        let current = svc.stock_snapshot("SKU-001").await.unwrap();
        assert_eq!(current.supplier.as_deref(), Some("PT Maju Bersama"));
        assert_eq!(current.purchase_price, 2_200);

        // every unit is explained by the ledger
        svc.verify_integrity("SKU-001").await.unwrap();
    }

    #[tokio::test]
    async fn test_record_movement_insufficient_stock_leaves_stock_unchanged() {
        let svc = service().await;
        seed_product(&svc, "SKU-001", 3, 3_000).await;

        let err = svc
            .record_movement(
                "SKU-001",
                MovementRequest {
                    quantity: 5,
                    created_by: "kasir1".to_string(),
                    detail: RequestDetail::Sale {
                        customer_name: "Budi".to_string(),
                        unit_sale_price: None,
                    },
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), ReasonCode::InsufficientStock);
        assert_eq!(svc.stock_snapshot("SKU-001").await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn test_ledger_pages_oldest_first() {
        let svc = service().await;
        seed_product(&svc, "SKU-001", 10, 3_000).await;
        svc.record_movement("SKU-001", damaged(2)).await.unwrap();

        let page = svc.ledger("SKU-001", 0, 10).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].stock_before, 0); // the seeding receipt
        assert_eq!(page[1].stock_after, 8);

        let err = svc.ledger("SKU-404", 0, 10).await.unwrap_err();
        assert_eq!(err.code(), ReasonCode::NotFound);
    }

    #[tokio::test]
    async fn test_integrity_halt_blocks_writes_until_reconciled() {
        let svc = service().await;
        seed_product(&svc, "SKU-001", 10, 3_000).await;

        // sane state passes
        svc.verify_integrity("SKU-001").await.unwrap();

        // corrupt the registry behind the ledger's back
        sqlx::query("UPDATE products SET stock = 99 WHERE id = 'SKU-001'")
            .execute(svc.db.pool())
            .await
            .unwrap();

        let err = svc.verify_integrity("SKU-001").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Db(DbError::IntegrityViolation { .. })
        ));
        assert!(svc.is_halted("SKU-001"));

        // further writes are refused
        let err = svc.record_movement("SKU-001", damaged(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::WritesHalted(_)));

        // reconcile and re-verify: the halt lifts
        sqlx::query("UPDATE products SET stock = 10 WHERE id = 'SKU-001'")
            .execute(svc.db.pool())
            .await
            .unwrap();
        svc.verify_integrity("SKU-001").await.unwrap();
        assert!(!svc.is_halted("SKU-001"));
        svc.record_movement("SKU-001", damaged(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_movement_metadata_validates_fields() {
        let svc = service().await;
        seed_product(&svc, "SKU-001", 10, 3_000).await;
        let movement = svc.record_movement("SKU-001", damaged(2)).await.unwrap();

        let err = svc
            .update_movement_metadata(
                &movement.id,
                &MovementDetail::Damaged {
                    remark: "   ".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ReasonCode::MissingRequiredField);

        let edited = svc
            .update_movement_metadata(
                &movement.id,
                &MovementDetail::Damaged {
                    remark: "pecah saat bongkar muat".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.quantity, 2);
    }
}
