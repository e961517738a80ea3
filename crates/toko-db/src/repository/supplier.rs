//! Suppliers and the goods received from them.
//!
//! Receiving itself (stock increment, discount math) is in
//! [`crate::engine::supply`]; this module only stores and reads rows.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use toko_core::validation::validate_required;
use toko_core::{Supplier, SupplyInvoice, SupplyInvoiceLine};

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn insert(&self, name: &str, contact: Option<&str>) -> DbResult<Supplier> {
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            name: validate_required("name", name, 200)?,
            contact: contact.map(str::to_string),
        };

        sqlx::query("INSERT INTO suppliers (id, name, contact) VALUES (?1, ?2, ?3)")
            .bind(&supplier.id)
            .bind(&supplier.name)
            .bind(&supplier.contact)
            .execute(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        fetch_supplier(&mut conn, id).await
    }

    /// Received invoices for a supplier, newest first.
    pub async fn supply_invoices(&self, supplier_id: &str) -> DbResult<Vec<SupplyInvoice>> {
        let rows = sqlx::query_as::<_, SupplyInvoice>(
            r#"
            SELECT id, supplier_id, invoice_number, total, supplied_at
            FROM supply_invoices
            WHERE supplier_id = ?1
            ORDER BY supplied_at DESC
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn supply_lines(&self, supply_invoice_id: &str) -> DbResult<Vec<SupplyInvoiceLine>> {
        let rows = sqlx::query_as::<_, SupplyInvoiceLine>(
            r#"
            SELECT id, supply_invoice_id, product_id, quantity, unit_cost, discount, line_total
            FROM supply_invoice_lines
            WHERE supply_invoice_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(supply_invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub(crate) async fn fetch_supplier(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Supplier>> {
    let supplier = sqlx::query_as::<_, Supplier>("SELECT id, name, contact FROM suppliers WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(supplier)
}

pub(crate) async fn insert_supply_invoice(
    conn: &mut SqliteConnection,
    invoice: &SupplyInvoice,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO supply_invoices (id, supplier_id, invoice_number, total, supplied_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.supplier_id)
    .bind(&invoice.invoice_number)
    .bind(invoice.total)
    .bind(invoice.supplied_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn insert_supply_line(
    conn: &mut SqliteConnection,
    line: &SupplyInvoiceLine,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO supply_invoice_lines (
            id, supply_invoice_id, product_id, quantity, unit_cost, discount, line_total
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&line.id)
    .bind(&line.supply_invoice_id)
    .bind(&line.product_id)
    .bind(line.quantity)
    .bind(line.unit_cost)
    .bind(&line.discount)
    .bind(line.line_total)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_supplier_roundtrip() {
        let db = test_db().await;
        let supplier = db
            .suppliers()
            .insert("CV Sumber Rejeki", Some("021-555"))
            .await
            .unwrap();

        let loaded = db.suppliers().get_by_id(&supplier.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "CV Sumber Rejeki");
        assert!(db.suppliers().supply_invoices(&supplier.id).await.unwrap().is_empty());
    }
}
