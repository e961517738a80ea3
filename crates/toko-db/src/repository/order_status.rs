//! Order status rows and the status log.
//!
//! Pickup and delivery orders keep their current status in separate tables
//! (`pickup_statuses`, `delivery_statuses`); the invoice's `order_type`
//! says which one. All functions here run inside a caller's transaction,
//! the state machine itself is in [`crate::engine::status`].

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::DbResult;
use toko_core::{OrderStatus, OrderStatusRecord, OrderType, StatusLogEntry};

const fn status_table(order_type: OrderType) -> &'static str {
    match order_type {
        OrderType::Pickup => "pickup_statuses",
        OrderType::Delivery => "delivery_statuses",
    }
}

/// Current status of an invoice, `None` if the invoice does not exist.
pub(crate) async fn fetch_status(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Option<OrderStatusRecord>> {
    let order_type =
        sqlx::query_scalar::<_, OrderType>("SELECT order_type FROM invoices WHERE id = ?1")
            .bind(invoice_id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(order_type) = order_type else {
        return Ok(None);
    };

    let address = match order_type {
        OrderType::Pickup => "NULL",
        OrderType::Delivery => "address",
    };
    let sql = format!(
        r#"
        SELECT invoice_id, ?2 AS order_type, status, {address} AS address,
               updated_by, created_at, updated_at
        FROM {}
        WHERE invoice_id = ?1
        "#,
        status_table(order_type)
    );

    let record = sqlx::query_as::<_, OrderStatusRecord>(&sql)
        .bind(invoice_id)
        .bind(order_type)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// Writes the status row created at checkout.
pub(crate) async fn insert_status(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    order_type: OrderType,
    status: OrderStatus,
    address: Option<&str>,
    updated_by: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let id = Uuid::new_v4().to_string();

    match order_type {
        OrderType::Pickup => {
            sqlx::query(
                r#"
                INSERT INTO pickup_statuses (id, invoice_id, status, updated_by, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                "#,
            )
            .bind(id)
            .bind(invoice_id)
            .bind(status)
            .bind(updated_by)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }
        OrderType::Delivery => {
            sqlx::query(
                r#"
                INSERT INTO delivery_statuses (id, invoice_id, status, address, updated_by, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                "#,
            )
            .bind(id)
            .bind(invoice_id)
            .bind(status)
            .bind(address.unwrap_or_default())
            .bind(updated_by)
            .bind(now)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

/// Moves the status from `expected` to `new`. Returns `false` if the row no
/// longer holds `expected`, i.e. someone else changed it first.
pub(crate) async fn compare_and_set(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    order_type: OrderType,
    expected: OrderStatus,
    new: OrderStatus,
    updated_by: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let sql = format!(
        r#"
        UPDATE {}
        SET status = ?3, updated_by = ?4, updated_at = ?5
        WHERE invoice_id = ?1 AND status = ?2
        "#,
        status_table(order_type)
    );
    let result = sqlx::query(&sql)
        .bind(invoice_id)
        .bind(expected)
        .bind(new)
        .bind(updated_by)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub(crate) async fn append_log(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    order_type: OrderType,
    previous: Option<OrderStatus>,
    new: OrderStatus,
    cashier_id: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_status_logs (
            invoice_id, order_type, previous_status, new_status, cashier_id, logged_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(invoice_id)
    .bind(order_type)
    .bind(previous)
    .bind(new)
    .bind(cashier_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Log rows for an invoice, oldest first.
pub(crate) async fn fetch_history(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Vec<StatusLogEntry>> {
    let rows = sqlx::query_as::<_, StatusLogEntry>(
        r#"
        SELECT id, invoice_id, order_type, previous_status, new_status, cashier_id, logged_at
        FROM order_status_logs
        WHERE invoice_id = ?1
        ORDER BY id
        "#,
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Invoices still awaiting payment with no payment row, oldest first.
///
/// Only candidates: the sweep re-checks each one inside its own
/// transaction before cancelling.
pub(crate) async fn unpaid_candidates(
    conn: &mut SqliteConnection,
) -> DbResult<Vec<(String, OrderType, DateTime<Utc>)>> {
    let rows = sqlx::query_as::<_, (String, OrderType, DateTime<Utc>)>(
        r#"
        SELECT i.id, i.order_type, i.created_at
        FROM invoices i
        LEFT JOIN pickup_statuses ps ON ps.invoice_id = i.id
        LEFT JOIN delivery_statuses ds ON ds.invoice_id = i.id
        WHERE COALESCE(ps.status, ds.status) = ?1
          AND NOT EXISTS (SELECT 1 FROM payments p WHERE p.invoice_id = i.id)
        ORDER BY i.created_at
        "#,
    )
    .bind(OrderStatus::AwaitingPayment)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
