//! Stock reconciliation on cancellation.
//!
//! Called only from the status engine, inside the transaction that moves
//! the order into `dibatalkan`. Since that move is refused from a terminal
//! state, a given invoice can be refunded at most once.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

/// Adds every invoice line's quantity back to its product.
///
/// Returns the number of products touched.
pub(crate) async fn return_stock(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET current_stock = current_stock + (
                SELECT SUM(d.quantity)
                FROM invoice_details d
                WHERE d.invoice_id = ?1 AND d.product_id = products.id
            ),
            updated_at = ?2
        WHERE id IN (SELECT product_id FROM invoice_details WHERE invoice_id = ?1)
        "#,
    )
    .bind(invoice_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!(invoice_id, products = result.rows_affected(), "Stock returned");
    Ok(result.rows_affected())
}
