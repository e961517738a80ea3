//! # Product Repository
//!
//! Products, their stock counter and their price history.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stock is only ever changed with a relative UPDATE:                     │
//! │                                                                         │
//! │    checkout     current_stock = current_stock - qty                     │
//! │                 WHERE current_stock >= qty        (0 rows = refused)   │
//! │    cancel       current_stock = current_stock + qty                     │
//! │    supply       current_stock = current_stock + qty                     │
//! │                                                                         │
//! │  Never "read, compute, write back": two checkouts racing for the last  │
//! │  unit both read 1, and the second would write a stale value.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use toko_core::validation::{validate_price, validate_product_name, validate_sku, validate_stock};
use toko_core::{CoreError, Money, NewProduct, PricingLogEntry, Product};

const PRODUCT_COLUMNS: &str =
    "id, sku, name, unit, image, price, current_stock, is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product with its opening stock.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        validate_sku(&new.sku)?;
        validate_product_name(&new.name)?;
        validate_price(new.price.rupiah())?;
        validate_stock(new.initial_stock)?;

        debug!(sku = %new.sku, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            unit: new.unit.trim().to_string(),
            image: new.image.clone(),
            price: new.price,
            current_stock: new.initial_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, unit, image, price, current_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.unit)
        .bind(&product.image)
        .bind(product.price)
        .bind(product.current_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists active products by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Changes the selling price and appends a pricing log row, atomically.
    ///
    /// Setting the same price again is a no-op and logs nothing.
    ///
    /// ## Errors
    /// * `ProductNotFound` - unknown id
    /// * `Validation` - negative price
    pub async fn update_price(&self, id: &str, new_price: Money) -> DbResult<Product> {
        validate_price(new_price.rupiah())?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Log first: the old price is read by the same statement that takes
        // the write lock.
        let logged = sqlx::query(
            r#"
            INSERT INTO pricing_logs (product_id, old_price, new_price, changed_at)
            SELECT id, price, ?2, ?3 FROM products WHERE id = ?1 AND price <> ?2
            "#,
        )
        .bind(id)
        .bind(new_price)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if logged > 0 {
            sqlx::query("UPDATE products SET price = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(new_price)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        tx.commit().await?;

        if logged > 0 {
            info!(product_id = %id, new_price = new_price.rupiah(), "Product price changed");
        }
        Ok(product)
    }

    /// Price changes for a product, oldest first.
    pub async fn pricing_history(&self, id: &str) -> DbResult<Vec<PricingLogEntry>> {
        let rows = sqlx::query_as::<_, PricingLogEntry>(
            r#"
            SELECT id, product_id, old_price, new_price, changed_at
            FROM pricing_logs
            WHERE product_id = ?1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Soft-deletes or restores a product. Inactive products cannot be
    /// added to carts or checked out; existing invoices keep their snapshot.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Number of products, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Current shelf stock, `None` for unknown products.
    pub async fn stock_of(&self, id: &str) -> DbResult<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>("SELECT current_stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(stock)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

/// Takes `qty` units off the shelf if, and only if, that many are there.
///
/// Returns `false` when the guard refused (not enough stock, inactive or
/// unknown product). Nothing is written in that case.
pub(crate) async fn try_decrement_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET current_stock = current_stock - ?2,
            updated_at = ?3
        WHERE id = ?1
          AND is_active = 1
          AND current_stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(qty)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Puts `qty` units back on the shelf.
pub(crate) async fn increment_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET current_stock = current_stock + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(product_id)
    .bind(qty)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_support::{new_product, test_db};
    use toko_core::{CoreError, Money};

    use crate::DbError;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let product = new_product(&db, "GULA-1KG", 16_000, 12).await;

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.sku, "GULA-1KG");
        assert_eq!(loaded.price, Money::from_rupiah(16_000));
        assert_eq!(loaded.current_stock, 12);
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        new_product(&db, "TEH-25", 5_000, 1).await;

        let dup = toko_core::NewProduct {
            sku: "TEH-25".into(),
            name: "Teh celup".into(),
            unit: "box".into(),
            image: None,
            price: Money::from_rupiah(5_500),
            initial_stock: 3,
        };
        let err = db.products().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_price_change_appends_pricing_log() {
        let db = test_db().await;
        let product = new_product(&db, "KOPI-200", 25_000, 5).await;

        db.products()
            .update_price(&product.id, Money::from_rupiah(27_500))
            .await
            .unwrap();
        db.products()
            .update_price(&product.id, Money::from_rupiah(27_500))
            .await
            .unwrap();
        db.products()
            .update_price(&product.id, Money::from_rupiah(26_000))
            .await
            .unwrap();

        let history = db.products().pricing_history(&product.id).await.unwrap();
        assert_eq!(history.len(), 2, "unchanged price must not be logged");
        assert_eq!(history[0].old_price, Money::from_rupiah(25_000));
        assert_eq!(history[0].new_price, Money::from_rupiah(27_500));
        assert_eq!(history[1].old_price, Money::from_rupiah(27_500));
        assert_eq!(history[1].new_price, Money::from_rupiah(26_000));

        let loaded = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(loaded.price, Money::from_rupiah(26_000));
    }

    #[tokio::test]
    async fn test_update_price_unknown_product() {
        let db = test_db().await;
        let err = db
            .products()
            .update_price("missing", Money::from_rupiah(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_conditional_decrement_guard() {
        let db = test_db().await;
        let product = new_product(&db, "MIE-GRG", 3_000, 2).await;
        let mut conn = db.pool().acquire().await.unwrap();
        let now = chrono::Utc::now();

        assert!(!super::try_decrement_stock(&mut conn, &product.id, 3, now).await.unwrap());
        assert!(super::try_decrement_stock(&mut conn, &product.id, 2, now).await.unwrap());
        assert!(!super::try_decrement_stock(&mut conn, &product.id, 1, now).await.unwrap());
        drop(conn);

        assert_eq!(db.products().stock_of(&product.id).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_inactive_products_hidden_from_listing() {
        let db = test_db().await;
        let a = new_product(&db, "A-1", 1_000, 1).await;
        new_product(&db, "B-1", 1_000, 1).await;

        db.products().set_active(&a.id, false).await.unwrap();
        let listed = db.products().list_active(50).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].sku, "B-1");
    }
}
