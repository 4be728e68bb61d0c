//! # Product Repository
//!
//! The persistent Product Registry: the single source of truth for live
//! stock.
//!
//! ## Key Rule
//! Nothing in this module writes the `stock` column. Stock changes only
//! through [`MovementRepository::commit`](crate::repository::movement::MovementRepository::commit),
//! which applies a validated movement's delta together with the ledger
//! append in one transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use gudang_core::Product;

/// Columns selected for every product read, kept in one place so the
/// queries below stay in sync with the `Product` field names.
const PRODUCT_COLUMNS: &str = "id, name, category, stock, min_stock, purchase_price, sale_price, \
     supplier, store_id, store_name, is_active, created_at, updated_at";

/// Repository for product registry operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get("SKU-001").await?;
/// let sku = repo.next_sku().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its SKU.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Finds an active product by name within a store, case-insensitively.
    ///
    /// Incoming receipts use this to decide between restocking an existing
    /// product and creating a new one.
    pub async fn find_by_name(&self, store_id: &str, name: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE store_id = ?1 AND name = ?2 COLLATE NOCASE AND is_active = 1"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(store_id)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products, optionally filtered by store, sorted by name.
    pub async fn list(&self, store_id: Option<&str>, limit: u32) -> DbResult<Vec<Product>> {
        let products = match store_id {
            Some(store_id) => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE is_active = 1 AND store_id = ?1 ORDER BY name LIMIT ?2"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(store_id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE is_active = 1 ORDER BY name LIMIT ?1"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, stock, min_stock,
                purchase_price, sale_price, supplier,
                store_id, store_name, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.purchase_price)
        .bind(product.sale_price)
        .bind(&product.supplier)
        .bind(&product.store_id)
        .bind(&product.store_name)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Generates the next free SKU in the `SKU-NNN` sequence.
    ///
    /// Numbers are zero-padded to three digits but keep growing past 999
    /// (`SKU-1000`, ...), matching the dashboard's historical SKUs.
    pub async fn next_sku(&self) -> DbResult<String> {
        let max: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(MAX(CAST(substr(id, 5) AS INTEGER)), 0)
            FROM products
            WHERE id LIKE 'SKU-%'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(format!("SKU-{:03}", max + 1))
    }

    /// Refreshes the supplier and purchase price after an incoming receipt.
    ///
    /// Metadata only; stock is untouched.
    pub async fn update_supply_info(
        &self,
        id: &str,
        supplier: &str,
        purchase_price: i64,
    ) -> DbResult<()> {
        debug!(id = %id, supplier = %supplier, "Refreshing supply info");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                supplier = ?2,
                purchase_price = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(supplier)
        .bind(purchase_price)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical movements still reference the row, so products are never
    /// hard-deleted.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                is_active = 0,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(id: &str, name: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "ATK".to_string(),
            stock,
            min_stock: 5,
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

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = test_db().await;
        let repo = db.products();

        let p = product("SKU-001", "Pensil 2B", 10);
        repo.insert(&p).await.unwrap();

        let loaded = repo.get("SKU-001").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Pensil 2B");
        assert_eq!(loaded.stock, 10);
        assert_eq!(loaded.supplier.as_deref(), Some("CV Sumber Jaya"));

        assert!(repo.get("SKU-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("SKU-001", "Pensil 2B", 10))
            .await
            .unwrap();
        let err = repo
            .insert(&product("SKU-001", "Pensil 2B", 10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_find_by_name_is_case_insensitive_and_store_scoped() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("SKU-001", "Pensil 2B", 10))
            .await
            .unwrap();

        let found = repo.find_by_name("TK-001", "pensil 2b").await.unwrap();
        assert_eq!(found.unwrap().id, "SKU-001");

        assert!(repo
            .find_by_name("TK-002", "Pensil 2B")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_next_sku_sequence() {
        let db = test_db().await;
        let repo = db.products();

        assert_eq!(repo.next_sku().await.unwrap(), "SKU-001");

        repo.insert(&product("SKU-001", "Pensil 2B", 10))
            .await
            .unwrap();
        repo.insert(&product("SKU-007", "Buku Tulis", 10))
            .await
            .unwrap();

        // continues past the highest existing number, not the count
        assert_eq!(repo.next_sku().await.unwrap(), "SKU-008");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("SKU-001", "Pensil 2B", 10))
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        repo.soft_delete("SKU-001").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo
            .find_by_name("TK-001", "Pensil 2B")
            .await
            .unwrap()
            .is_none());

        // the row itself survives for movement history
        let hidden = repo.get("SKU-001").await.unwrap().unwrap();
        assert!(!hidden.is_active);
    }

    #[tokio::test]
    async fn test_update_supply_info() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("SKU-001", "Pensil 2B", 10))
            .await
            .unwrap();
        repo.update_supply_info("SKU-001", "PT Maju Bersama", 2_200)
            .await
            .unwrap();

        let loaded = repo.get("SKU-001").await.unwrap().unwrap();
        assert_eq!(loaded.supplier.as_deref(), Some("PT Maju Bersama"));
        assert_eq!(loaded.purchase_price, 2_200);
        // stock untouched
        assert_eq!(loaded.stock, 10);
    }

    #[tokio::test]
    async fn test_list_filters_by_store() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("SKU-001", "Pensil 2B", 10))
            .await
            .unwrap();
        let mut other = product("SKU-002", "Buku Tulis", 4);
        other.store_id = "TK-002".to_string();
        repo.insert(&other).await.unwrap();

        assert_eq!(repo.list(None, 50).await.unwrap().len(), 2);
        let one = repo.list(Some("TK-002"), 50).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, "SKU-002");
    }
}
