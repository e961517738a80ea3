//! # Cart Repository
//!
//! Customer and cashier carts.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Actor::Customer(id) ──► customer_cart_items (owner_id → customers)    │
//! │  Actor::Cashier(id)  ──► cashier_cart_items  (owner_id → cashiers)     │
//! │                                                                         │
//! │  One row per (owner, product). Rows hold only the quantity; name and   │
//! │  price are joined from products when the cart is listed.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation validates first and then writes with a single statement,
//! so a rejected edit leaves the cart exactly as it was. Concurrent edits
//! of the same line are last-write-wins; stock is enforced for real only at
//! checkout.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::people::{fetch_cashier, fetch_customer};
use crate::repository::product::fetch_product;
use toko_core::validation::{validate_cart_size, validate_quantity};
use toko_core::{Actor, ActorKind, CartLine, CartSummary, CheckoutLine, CoreError, Product};

const fn cart_table(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Customer => "customer_cart_items",
        ActorKind::Cashier => "cashier_cart_items",
    }
}

#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds `qty` onto whatever is already in the cart for this product.
    ///
    /// Returns the resulting quantity. The resulting quantity, not the
    /// increment, is what gets checked against stock.
    ///
    /// ## Errors
    /// * `CustomerNotFound` / `CashierNotFound` - unknown owner
    /// * `ProductNotFound` - unknown or inactive product
    /// * `StockExceeded` - existing + qty > current stock
    /// * `CartTooLarge` - new product line on a full cart
    pub async fn add_item(&self, owner: &Actor, product_id: &str, qty: i64) -> DbResult<i64> {
        validate_quantity(qty)?;

        let mut conn = self.pool.acquire().await?;

        ensure_owner(&mut conn, owner).await?;
        let product = active_product(&mut conn, product_id).await?;

        let existing = line_quantity(&mut conn, owner, product_id).await?;
        if existing.is_none() {
            validate_cart_size(line_count(&mut conn, owner).await?)?;
        }

        let new_qty = existing.unwrap_or(0) + qty;
        validate_quantity(new_qty)?;
        check_against_stock(&product, new_qty)?;

        upsert_line(&mut conn, owner, product_id, new_qty).await?;

        debug!(%owner, product_id, quantity = new_qty, "Cart item added");
        Ok(new_qty)
    }

    /// Sets the absolute quantity of a line. `qty <= 0` removes the line.
    ///
    /// Returns the stored quantity, or `None` if the line was removed.
    pub async fn set_quantity(
        &self,
        owner: &Actor,
        product_id: &str,
        qty: i64,
    ) -> DbResult<Option<i64>> {
        if qty <= 0 {
            self.remove_item(owner, product_id).await?;
            return Ok(None);
        }
        validate_quantity(qty)?;

        let mut conn = self.pool.acquire().await?;

        ensure_owner(&mut conn, owner).await?;
        let product = active_product(&mut conn, product_id).await?;

        if line_quantity(&mut conn, owner, product_id).await?.is_none() {
            validate_cart_size(line_count(&mut conn, owner).await?)?;
        }
        check_against_stock(&product, qty)?;

        upsert_line(&mut conn, owner, product_id, qty).await?;

        debug!(%owner, product_id, quantity = qty, "Cart quantity set");
        Ok(Some(qty))
    }

    /// Removes one product from the cart. Removing a product that is not in
    /// the cart is not an error; the return value says whether a row went.
    pub async fn remove_item(&self, owner: &Actor, product_id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        ensure_owner(&mut conn, owner).await?;

        let sql = format!(
            "DELETE FROM {} WHERE owner_id = ?1 AND product_id = ?2",
            cart_table(owner.kind())
        );
        let result = sqlx::query(&sql)
            .bind(owner.id())
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Empties the cart. Returns the number of lines removed.
    pub async fn clear(&self, owner: &Actor) -> DbResult<u64> {
        let mut conn = self.pool.acquire().await?;
        ensure_owner(&mut conn, owner).await?;
        let removed = clear_cart(&mut conn, owner).await?;

        debug!(%owner, removed, "Cart cleared");
        Ok(removed)
    }

    /// Lists the cart priced at current shelf prices, oldest line first.
    /// An empty cart is a valid, empty summary.
    pub async fn list(&self, owner: &Actor) -> DbResult<CartSummary> {
        let mut conn = self.pool.acquire().await?;
        ensure_owner(&mut conn, owner).await?;

        let sql = format!(
            r#"
            SELECT
                c.product_id,
                p.name,
                p.unit,
                p.image,
                p.price AS unit_price,
                c.quantity,
                p.price * c.quantity AS subtotal,
                p.current_stock AS available_stock
            FROM {} c
            JOIN products p ON p.id = c.product_id
            WHERE c.owner_id = ?1
            ORDER BY c.created_at, c.product_id
            "#,
            cart_table(owner.kind())
        );

        let lines = sqlx::query_as::<_, CartLine>(&sql)
            .bind(owner.id())
            .fetch_all(&mut *conn)
            .await?;

        Ok(CartSummary::new(owner.clone(), lines))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Fails with the owner-specific not-found error for unknown owners.
pub(crate) async fn ensure_owner(conn: &mut SqliteConnection, owner: &Actor) -> DbResult<()> {
    match owner {
        Actor::Customer(id) => {
            fetch_customer(conn, id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?;
        }
        Actor::Cashier(id) => {
            fetch_cashier(conn, id)
                .await?
                .ok_or_else(|| CoreError::CashierNotFound(id.clone()))?;
        }
    }
    Ok(())
}

async fn active_product(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Product> {
    match fetch_product(conn, product_id).await? {
        Some(product) if product.is_active => Ok(product),
        _ => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
    }
}

fn check_against_stock(product: &Product, quantity: i64) -> DbResult<()> {
    if !product.has_stock_for(quantity) {
        return Err(CoreError::StockExceeded {
            product_id: product.id.clone(),
            requested: quantity,
            available: product.current_stock,
        }
        .into());
    }
    Ok(())
}

async fn line_quantity(
    conn: &mut SqliteConnection,
    owner: &Actor,
    product_id: &str,
) -> DbResult<Option<i64>> {
    let sql = format!(
        "SELECT quantity FROM {} WHERE owner_id = ?1 AND product_id = ?2",
        cart_table(owner.kind())
    );
    let qty = sqlx::query_scalar::<_, i64>(&sql)
        .bind(owner.id())
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(qty)
}

async fn line_count(conn: &mut SqliteConnection, owner: &Actor) -> DbResult<usize> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE owner_id = ?1",
        cart_table(owner.kind())
    );
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(owner.id())
        .fetch_one(&mut *conn)
        .await?;
    Ok(usize::try_from(count).unwrap_or(usize::MAX))
}

async fn upsert_line(
    conn: &mut SqliteConnection,
    owner: &Actor,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO {} (owner_id, product_id, quantity, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        ON CONFLICT (owner_id, product_id) DO UPDATE SET
            quantity = excluded.quantity,
            updated_at = excluded.updated_at
        "#,
        cart_table(owner.kind())
    );
    sqlx::query(&sql)
        .bind(owner.id())
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn clear_cart(conn: &mut SqliteConnection, owner: &Actor) -> DbResult<u64> {
    let sql = format!("DELETE FROM {} WHERE owner_id = ?1", cart_table(owner.kind()));
    let result = sqlx::query(&sql).bind(owner.id()).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

#[derive(sqlx::FromRow)]
struct DrainedLine {
    product_id: String,
    quantity: i64,
    created_at: DateTime<Utc>,
}

/// Deletes every line of the cart and returns them, oldest first.
///
/// This is a write, so as the first statement of a checkout it makes the
/// transaction take SQLite's write lock before anything is read.
pub(crate) async fn drain_cart(
    conn: &mut SqliteConnection,
    owner: &Actor,
) -> DbResult<Vec<CheckoutLine>> {
    let sql = format!(
        "DELETE FROM {} WHERE owner_id = ?1 RETURNING product_id, quantity, created_at",
        cart_table(owner.kind())
    );
    let mut rows = sqlx::query_as::<_, DrainedLine>(&sql)
        .bind(owner.id())
        .fetch_all(&mut *conn)
        .await?;

    // RETURNING order is unspecified
    rows.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    Ok(rows
        .into_iter()
        .map(|row| CheckoutLine::new(row.product_id, row.quantity))
        .collect())
}

#[cfg(test)]
mod tests {
    use crate::test_support::{new_product, seed_people, test_db};
    use crate::DbError;
    use toko_core::{Actor, CoreError, Money, ValidationError, MAX_CART_ITEMS};

    #[tokio::test]
    async fn test_add_item_accumulates_and_checks_absolute_quantity() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let owner = Actor::Customer(customer.id.clone());
        let product = new_product(&db, "BERAS-5", 72_000, 5).await;

        assert_eq!(db.carts().add_item(&owner, &product.id, 2).await.unwrap(), 2);
        assert_eq!(db.carts().add_item(&owner, &product.id, 3).await.unwrap(), 5);

        let err = db.carts().add_item(&owner, &product.id, 1).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::StockExceeded {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 6);
                assert_eq!(available, 5);
            }
            other => panic!("expected StockExceeded, got {other:?}"),
        }

        let cart = db.carts().list(&owner).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].quantity, 5, "failed add must not change the cart");
    }

    #[tokio::test]
    async fn test_set_quantity_is_absolute_and_zero_removes() {
        let db = test_db().await;
        let (_, cashier) = seed_people(&db).await;
        let owner = Actor::Cashier(cashier.id.clone());
        let product = new_product(&db, "SABUN-1", 4_000, 10).await;

        db.carts().add_item(&owner, &product.id, 4).await.unwrap();
        assert_eq!(
            db.carts().set_quantity(&owner, &product.id, 2).await.unwrap(),
            Some(2)
        );
        assert!(matches!(
            db.carts().set_quantity(&owner, &product.id, 11).await,
            Err(DbError::Domain(CoreError::StockExceeded { .. }))
        ));
        assert_eq!(db.carts().set_quantity(&owner, &product.id, 0).await.unwrap(), None);
        assert!(db.carts().list(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_prices_from_products() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let owner = Actor::Customer(customer.id.clone());
        let a = new_product(&db, "A", 3_000, 10).await;
        let b = new_product(&db, "B", 12_500, 10).await;

        db.carts().add_item(&owner, &a.id, 2).await.unwrap();
        db.carts().add_item(&owner, &b.id, 1).await.unwrap();

        let cart = db.carts().list(&owner).await.unwrap();
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.total, Money::from_rupiah(18_500));

        // live pricing until checkout
        db.products()
            .update_price(&a.id, Money::from_rupiah(3_500))
            .await
            .unwrap();
        let cart = db.carts().list(&owner).await.unwrap();
        assert_eq!(cart.total, Money::from_rupiah(19_500));
    }

    #[tokio::test]
    async fn test_customer_and_cashier_carts_are_separate() {
        let db = test_db().await;
        let (customer, cashier) = seed_people(&db).await;
        let product = new_product(&db, "X", 1_000, 10).await;

        db.carts()
            .add_item(&Actor::Customer(customer.id.clone()), &product.id, 1)
            .await
            .unwrap();

        let cashier_cart = db.carts().list(&Actor::Cashier(cashier.id.clone())).await.unwrap();
        assert!(cashier_cart.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_owner_and_product() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let product = new_product(&db, "Y", 1_000, 10).await;

        assert!(matches!(
            db.carts()
                .add_item(&Actor::Customer("ghost".into()), &product.id, 1)
                .await,
            Err(DbError::Domain(CoreError::CustomerNotFound(_)))
        ));
        assert!(matches!(
            db.carts().list(&Actor::Cashier("ghost".into())).await,
            Err(DbError::Domain(CoreError::CashierNotFound(_)))
        ));
        assert!(matches!(
            db.carts()
                .add_item(&Actor::Customer(customer.id.clone()), "missing", 1)
                .await,
            Err(DbError::Domain(CoreError::ProductNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_quantity_bounds() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let owner = Actor::Customer(customer.id.clone());
        let product = new_product(&db, "Z", 1_000, 5_000).await;

        assert!(matches!(
            db.carts().add_item(&owner, &product.id, 0).await,
            Err(DbError::Domain(CoreError::Validation(
                ValidationError::MustBePositive { .. }
            )))
        ));
        db.carts().add_item(&owner, &product.id, 999).await.unwrap();
        assert!(matches!(
            db.carts().add_item(&owner, &product.id, 1).await,
            Err(DbError::Domain(CoreError::Validation(
                ValidationError::OutOfRange { .. }
            )))
        ));
    }

    #[tokio::test]
    async fn test_cart_size_limit() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let owner = Actor::Customer(customer.id.clone());

        for i in 0..MAX_CART_ITEMS {
            let p = new_product(&db, &format!("SKU-{i}"), 100, 1).await;
            db.carts().add_item(&owner, &p.id, 1).await.unwrap();
        }
        let extra = new_product(&db, "SKU-EXTRA", 100, 1).await;
        assert!(matches!(
            db.carts().add_item(&owner, &extra.id, 1).await,
            Err(DbError::Domain(CoreError::CartTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let owner = Actor::Customer(customer.id.clone());
        let a = new_product(&db, "R1", 1_000, 10).await;
        let b = new_product(&db, "R2", 1_000, 10).await;

        db.carts().add_item(&owner, &a.id, 1).await.unwrap();
        db.carts().add_item(&owner, &b.id, 1).await.unwrap();

        assert!(db.carts().remove_item(&owner, &a.id).await.unwrap());
        assert!(!db.carts().remove_item(&owner, &a.id).await.unwrap());
        assert_eq!(db.carts().clear(&owner).await.unwrap(), 1);
        assert!(db.carts().list(&owner).await.unwrap().is_empty());
    }
}
