//! # Movement Repository
//!
//! The append-only stock movement ledger.
//!
//! ## Commit Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit(movement)                                                       │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT movement  ── id already present? ──► no-op, keep stock        │
//! │    UPDATE products SET stock = stock + delta                            │
//! │    SELECT product   ── stock != stock_after? ──► rollback, integrity    │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  One transaction per movement: the ledger append and the registry      │
//! │  delta land together or not at all, so replaying the ledger always     │
//! │  reproduces the registry (the round-trip law).                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! History entries are immutable once appended; only subtype metadata may
//! be edited, never the quantity or the stock snapshots. Corrections are
//! modeled as new compensating movements.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use gudang_core::{MovementDetail, Product, StockMovement};

/// Columns selected for every movement read.
const MOVEMENT_COLUMNS: &str = "id, product_id, store_id, kind, quantity, stock_before, stock_after, \
     supplier, unit_purchase_price, notes, \
     customer_name, unit_sale_price, total_price, \
     destination, recipient, shipping_doc_number, remark, \
     created_by, created_at";

/// Repository for the stock movement ledger.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Atomically appends a validated movement and applies its stock delta.
    ///
    /// ## Idempotency
    /// The movement id is the idempotency key: committing the same id a
    /// second time changes nothing and returns the current product state,
    /// so duplicate submissions never double-apply.
    ///
    /// ## Returns
    /// The product as it stands after the commit.
    pub async fn commit(&self, movement: &StockMovement) -> DbResult<Product> {
        debug!(
            id = %movement.id,
            product_id = %movement.product_id,
            kind = movement.detail.kind_label(),
            quantity = movement.quantity,
            "Committing movement"
        );

        let cols = DetailColumns::split(&movement.detail);

        let mut tx = self.pool.begin().await?;

        // ON CONFLICT(id) DO NOTHING makes replays visible as zero
        // affected rows without masking CHECK or FK violations
        let inserted = sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, store_id, kind,
                quantity, stock_before, stock_after,
                supplier, unit_purchase_price, notes,
                customer_name, unit_sale_price, total_price,
                destination, recipient, shipping_doc_number, remark,
                created_by, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9, ?10,
                ?11, ?12, ?13,
                ?14, ?15, ?16, ?17,
                ?18, ?19
            )
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(&movement.store_id)
        .bind(movement.detail.kind_label())
        .bind(movement.quantity)
        .bind(movement.stock_before)
        .bind(movement.stock_after)
        .bind(&cols.supplier)
        .bind(cols.unit_purchase_price)
        .bind(&cols.notes)
        .bind(&cols.customer_name)
        .bind(cols.unit_sale_price)
        .bind(cols.total_price)
        .bind(&cols.destination)
        .bind(&cols.recipient)
        .bind(&cols.shipping_doc_number)
        .bind(&cols.remark)
        .bind(&movement.created_by)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if inserted {
            let updated = sqlx::query(
                r#"
                UPDATE products SET
                    stock = stock + ?2,
                    updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&movement.product_id)
            .bind(movement.delta())
            .bind(movement.created_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                return Err(DbError::not_found("Product", &movement.product_id));
            }
        }

        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, category, stock, min_stock, purchase_price, sale_price, \
             supplier, store_id, store_name, is_active, created_at, updated_at \
             FROM products WHERE id = ?1",
        )
        .bind(&movement.product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", &movement.product_id))?;

        // A freshly applied movement must land exactly on its declared
        // stock_after; anything else means the validator saw a stale
        // snapshot and the transaction must not commit
        if inserted && product.stock != movement.stock_after {
            return Err(DbError::IntegrityViolation {
                product_id: movement.product_id.clone(),
                ledger_stock: movement.stock_after,
                registry_stock: product.stock,
            });
        }

        tx.commit().await?;

        Ok(product)
    }

    /// Gets a movement by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<StockMovement>> {
        let sql = format!("SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE id = ?1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        row.map(|r| movement_from_row(&r)).transpose()
    }

    /// Reads a page of a product's history, oldest first.
    ///
    /// `page` is zero-based. The ordering is the append order (`seq`), so
    /// repeated calls with increasing pages walk the full, finite history
    /// exactly once.
    pub async fn history(
        &self,
        product_id: &str,
        page: u32,
        per_page: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ?1 ORDER BY seq ASC LIMIT ?2 OFFSET ?3"
        );
        let rows = sqlx::query(&sql)
            .bind(product_id)
            .bind(per_page)
            .bind(page * per_page)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(movement_from_row).collect()
    }

    /// Folds the product's full history into a stock level.
    ///
    /// The round-trip law: this must equal the registry's current stock for
    /// every product. [`StoreService::verify_integrity`] compares the two
    /// and halts writes on divergence.
    ///
    /// [`StoreService::verify_integrity`]: crate::service::StoreService::verify_integrity
    pub async fn fold_stock(&self, product_id: &str) -> DbResult<i64> {
        let folded: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN kind = 'incoming' THEN quantity ELSE -quantity END
            ), 0)
            FROM stock_movements
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(folded)
    }

    /// Number of ledger entries for a product.
    pub async fn count_for_product(&self, product_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements WHERE product_id = ?1")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Edits a movement's subtype metadata in place.
    ///
    /// The subtype must stay the same and neither the quantity nor the
    /// stock snapshots can change through this path. A sale's stored total
    /// is recomputed from the stored quantity whenever its unit price is
    /// edited, so history totals never drift from `quantity × price`.
    pub async fn update_metadata(
        &self,
        id: &str,
        detail: &MovementDetail,
    ) -> DbResult<StockMovement> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Movement", id))?;

        if existing.detail.kind_label() != detail.kind_label() {
            return Err(DbError::Internal(format!(
                "movement {} is '{}', refusing metadata edit as '{}'",
                id,
                existing.detail.kind_label(),
                detail.kind_label()
            )));
        }

        debug!(id = %id, kind = detail.kind_label(), "Updating movement metadata");

        let mut cols = DetailColumns::split(detail);
        if let MovementDetail::Sale { unit_sale_price, .. } = detail {
            cols.total_price = Some(existing.quantity * unit_sale_price);
        }

        sqlx::query(
            r#"
            UPDATE stock_movements SET
                supplier = ?2,
                unit_purchase_price = ?3,
                notes = ?4,
                customer_name = ?5,
                unit_sale_price = ?6,
                total_price = ?7,
                destination = ?8,
                recipient = ?9,
                shipping_doc_number = ?10,
                remark = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&cols.supplier)
        .bind(cols.unit_purchase_price)
        .bind(&cols.notes)
        .bind(&cols.customer_name)
        .bind(cols.unit_sale_price)
        .bind(cols.total_price)
        .bind(&cols.destination)
        .bind(&cols.recipient)
        .bind(&cols.shipping_doc_number)
        .bind(&cols.remark)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Movement", id))
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// The tagged detail union flattened into the ledger's nullable columns.
#[derive(Debug, Default)]
struct DetailColumns {
    supplier: Option<String>,
    unit_purchase_price: Option<i64>,
    notes: Option<String>,
    customer_name: Option<String>,
    unit_sale_price: Option<i64>,
    total_price: Option<i64>,
    destination: Option<String>,
    recipient: Option<String>,
    shipping_doc_number: Option<String>,
    remark: Option<String>,
}

impl DetailColumns {
    fn split(detail: &MovementDetail) -> Self {
        let mut cols = DetailColumns::default();
        match detail {
            MovementDetail::Incoming {
                supplier,
                unit_purchase_price,
                notes,
            } => {
                cols.supplier = Some(supplier.clone());
                cols.unit_purchase_price = Some(*unit_purchase_price);
                cols.notes = Some(notes.clone());
            }
            MovementDetail::Sale {
                customer_name,
                unit_sale_price,
                total_price,
            } => {
                cols.customer_name = Some(customer_name.clone());
                cols.unit_sale_price = Some(*unit_sale_price);
                cols.total_price = Some(*total_price);
            }
            MovementDetail::Distribution {
                destination,
                recipient,
                shipping_doc_number,
            } => {
                cols.destination = Some(destination.clone());
                cols.recipient = Some(recipient.clone());
                cols.shipping_doc_number = Some(shipping_doc_number.clone());
            }
            MovementDetail::InternalUse { remark } => cols.remark = Some(remark.clone()),
            MovementDetail::Damaged { remark } => cols.remark = Some(remark.clone()),
            MovementDetail::Expired { remark } => cols.remark = Some(remark.clone()),
        }
        cols
    }
}

/// Flat ledger row, before reassembling the tagged union.
#[derive(Debug, FromRow)]
struct MovementRow {
    id: String,
    product_id: String,
    store_id: String,
    kind: String,
    quantity: i64,
    stock_before: i64,
    stock_after: i64,
    supplier: Option<String>,
    unit_purchase_price: Option<i64>,
    notes: Option<String>,
    customer_name: Option<String>,
    unit_sale_price: Option<i64>,
    total_price: Option<i64>,
    destination: Option<String>,
    recipient: Option<String>,
    shipping_doc_number: Option<String>,
    remark: Option<String>,
    created_by: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn movement_from_row(row: &SqliteRow) -> DbResult<StockMovement> {
    let row = MovementRow::from_row(row).map_err(DbError::from)?;

    let missing = |column: &str| {
        DbError::Internal(format!(
            "movement {}: missing {} for kind '{}'",
            row.id, column, row.kind
        ))
    };

    let detail = match row.kind.as_str() {
        "incoming" => MovementDetail::Incoming {
            supplier: row.supplier.ok_or_else(|| missing("supplier"))?,
            unit_purchase_price: row.unit_purchase_price.unwrap_or(0),
            notes: row.notes.unwrap_or_default(),
        },
        "sale" => MovementDetail::Sale {
            customer_name: row.customer_name.ok_or_else(|| missing("customer_name"))?,
            unit_sale_price: row
                .unit_sale_price
                .ok_or_else(|| missing("unit_sale_price"))?,
            total_price: row.total_price.ok_or_else(|| missing("total_price"))?,
        },
        "distribution" => MovementDetail::Distribution {
            destination: row.destination.ok_or_else(|| missing("destination"))?,
            recipient: row.recipient.unwrap_or_default(),
            shipping_doc_number: row.shipping_doc_number.unwrap_or_default(),
        },
        "internal_use" => MovementDetail::InternalUse {
            remark: row.remark.ok_or_else(|| missing("remark"))?,
        },
        "damaged" => MovementDetail::Damaged {
            remark: row.remark.ok_or_else(|| missing("remark"))?,
        },
        "expired" => MovementDetail::Expired {
            remark: row.remark.ok_or_else(|| missing("remark"))?,
        },
        other => {
            return Err(DbError::Internal(format!(
                "movement {}: unknown kind '{}'",
                row.id, other
            )))
        }
    };

    Ok(StockMovement {
        id: row.id,
        product_id: row.product_id,
        store_id: row.store_id,
        quantity: row.quantity,
        stock_before: row.stock_before,
        stock_after: row.stock_after,
        created_by: row.created_by,
        created_at: row.created_at,
        detail,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
