//! Customers and cashiers.
//!
//! Only what checkout, carts and the status log need: create and look up.
//! Account management and authentication live outside this system.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use toko_core::validation::validate_required;
use toko_core::{Cashier, Customer};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn insert(
        &self,
        name: &str,
        contact: Option<&str>,
        address: Option<&str>,
    ) -> DbResult<Customer> {
        let name = validate_required("name", name, 200)?;
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name,
            contact: contact.map(str::to_string),
            address: address.map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, name, contact, address, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.contact)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }
}

#[derive(Debug, Clone)]
pub struct CashierRepository {
    pool: SqlitePool,
}

impl CashierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashierRepository { pool }
    }

    pub async fn insert(&self, name: &str) -> DbResult<Cashier> {
        let name = validate_required("name", name, 200)?;
        let cashier = Cashier {
            id: Uuid::new_v4().to_string(),
            name,
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(id = %cashier.id, "Inserting cashier");

        sqlx::query("INSERT INTO cashiers (id, name, is_active, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&cashier.id)
            .bind(&cashier.name)
            .bind(cashier.is_active)
            .bind(cashier.created_at)
            .execute(&self.pool)
            .await?;

        Ok(cashier)
    }

    /// Active cashiers only.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Cashier>> {
        let mut conn = self.pool.acquire().await?;
        fetch_cashier(&mut conn, id).await
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        sqlx::query("UPDATE cashiers SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub(crate) async fn fetch_customer(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        "SELECT id, name, contact, address, created_at FROM customers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(customer)
}

/// A deactivated cashier is treated as unknown.
pub(crate) async fn fetch_cashier(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Cashier>> {
    let cashier = sqlx::query_as::<_, Cashier>(
        "SELECT id, name, is_active, created_at FROM cashiers WHERE id = ?1 AND is_active = 1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(cashier)
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_customer_roundtrip() {
        let db = test_db().await;
        let customer = db
            .customers()
            .insert("Siti", Some("0812-1111"), Some("Jl. Melati 3"))
            .await
            .unwrap();

        let loaded = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Siti");
        assert_eq!(loaded.address.as_deref(), Some("Jl. Melati 3"));
        assert!(db.customers().get_by_id("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deactivated_cashier_is_not_found() {
        let db = test_db().await;
        let cashier = db.cashiers().insert("Budi").await.unwrap();
        assert!(db.cashiers().get_by_id(&cashier.id).await.unwrap().is_some());

        db.cashiers().deactivate(&cashier.id).await.unwrap();
        assert!(db.cashiers().get_by_id(&cashier.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let db = test_db().await;
        assert!(db.cashiers().insert("   ").await.is_err());
    }
}
