//! Payment rows. At most one per invoice; a second upload replaces the
//! amount and proof but keeps the row id and the first `paid_at`.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::DbResult;
use toko_core::{Money, Payment};

pub(crate) async fn fetch_payment(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        "SELECT id, invoice_id, amount, proof_image, paid_at, updated_at FROM payments WHERE invoice_id = ?1",
    )
    .bind(invoice_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(payment)
}

/// Inserts or replaces the payment for `invoice_id` and returns the stored row.
pub(crate) async fn upsert_payment(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    amount: Money,
    proof_image: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<Payment> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (id, invoice_id, amount, proof_image, paid_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT (invoice_id) DO UPDATE SET
            amount = excluded.amount,
            proof_image = excluded.proof_image,
            updated_at = excluded.updated_at
        RETURNING id, invoice_id, amount, proof_image, paid_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(invoice_id)
    .bind(amount)
    .bind(proof_image)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(payment)
}
