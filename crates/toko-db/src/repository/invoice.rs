//! # Invoice Repository
//!
//! Invoices are written once, by the checkout engine, and never updated.
//! Everything that changes afterwards (status, payment) lives in its own
//! table.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::order_status::fetch_status;
use crate::repository::payment::fetch_payment;
use toko_core::{CoreError, Invoice, InvoiceDetail, OrderView};

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_id, customer_name, customer_contact, \
     order_type, payment_option, cashier_id, cashier_name, total, created_at";

const DETAIL_COLUMNS: &str =
    "id, invoice_id, product_id, product_name, product_unit, product_image, quantity, unit_price";

/// Builds a receipt number such as `INV-20260118-3FA2C9D1`.
///
/// The suffix is random, so numbers are not sequential. The invoice `id`
/// stays the key; this is only printed.
pub fn generate_invoice_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("INV-{}-{}", now.format("%Y%m%d"), suffix)
}

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut conn, id).await
    }

    /// Invoice lines in the order they were written at checkout.
    pub async fn details(&self, invoice_id: &str) -> DbResult<Vec<InvoiceDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_details(&mut conn, invoice_id).await
    }

    /// A customer's order history, newest first.
    pub async fn list_for_customer(&self, customer_id: &str, limit: u32) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE customer_id = ?1 ORDER BY created_at DESC LIMIT ?2"
        );
        let rows = sqlx::query_as::<_, Invoice>(&sql)
            .bind(customer_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Invoice, lines, current status and payment in one read.
    ///
    /// ## Errors
    /// * `InvoiceNotFound` - unknown id
    pub async fn get_order(&self, id: &str) -> DbResult<OrderView> {
        let mut conn = self.pool.acquire().await?;

        let invoice = fetch_invoice(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;
        let details = fetch_details(&mut conn, id).await?;
        let status = fetch_status(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))?;
        let payment = fetch_payment(&mut conn, id).await?;

        Ok(OrderView {
            invoice,
            details,
            status,
            payment,
        })
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

pub(crate) async fn fetch_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1");
    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(invoice)
}

pub(crate) async fn fetch_details(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Vec<InvoiceDetail>> {
    let sql = format!("SELECT {DETAIL_COLUMNS} FROM invoice_details WHERE invoice_id = ?1 ORDER BY rowid");
    let details = sqlx::query_as::<_, InvoiceDetail>(&sql)
        .bind(invoice_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(details)
}

pub(crate) async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, customer_id, customer_name, customer_contact,
            order_type, payment_option, cashier_id, cashier_name, total, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.customer_id)
    .bind(&invoice.customer_name)
    .bind(&invoice.customer_contact)
    .bind(invoice.order_type)
    .bind(invoice.payment_option)
    .bind(&invoice.cashier_id)
    .bind(&invoice.cashier_name)
    .bind(invoice.total)
    .bind(invoice.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn insert_detail(conn: &mut SqliteConnection, detail: &InvoiceDetail) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_details (
            id, invoice_id, product_id, product_name, product_unit,
            product_image, quantity, unit_price
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&detail.id)
    .bind(&detail.invoice_id)
    .bind(&detail.product_id)
    .bind(&detail.product_name)
    .bind(&detail.product_unit)
    .bind(&detail.product_image)
    .bind(detail.quantity)
    .bind(detail.unit_price)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
