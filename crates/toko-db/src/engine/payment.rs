//! Payment proof upload.
//!
//! A customer pays by transfer and uploads the receipt. The payment row is
//! stored (or replaced) and an order still waiting for payment moves on to
//! `diproses` in the same transaction.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::engine::status::apply_transition;
use crate::error::{DbError, DbResult};
use crate::repository::order_status::fetch_status;
use crate::repository::payment::upsert_payment;
use toko_core::validation::validate_payment_amount;
use toko_core::{CoreError, OrderStatus, Payment, PaymentProof};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub payment: Payment,
    /// Status after the upload.
    pub status: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct PaymentEngine {
    pool: SqlitePool,
}

impl PaymentEngine {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentEngine { pool }
    }

    /// Stores the payment proof for an invoice.
    ///
    /// ## Errors
    /// * `Validation` - amount not positive
    /// * `InvoiceNotFound`
    /// * `TerminalState` - order was cancelled
    pub async fn upload_payment_proof(
        &self,
        invoice_id: &str,
        proof: &PaymentProof,
    ) -> DbResult<PaymentOutcome> {
        validate_payment_amount(proof.amount.rupiah())?;

        {
            let mut conn = self.pool.acquire().await?;
            if fetch_status(&mut conn, invoice_id).await?.is_none() {
                return Err(CoreError::InvoiceNotFound(invoice_id.to_string()).into());
            }
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let payment = upsert_payment(
            &mut tx,
            invoice_id,
            proof.amount,
            proof.proof_image.as_deref(),
            now,
        )
        .await?;

        // Holding the write lock now, so this read is current.
        let current = fetch_status(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;

        let status = match current.status {
            OrderStatus::Cancelled => {
                return Err(CoreError::TerminalState {
                    invoice_id: invoice_id.to_string(),
                    current_status: current.status,
                }
                .into());
            }
            OrderStatus::AwaitingPayment => {
                apply_transition(
                    &mut tx,
                    invoice_id,
                    current.order_type,
                    OrderStatus::AwaitingPayment,
                    OrderStatus::Processing,
                    None,
                    now,
                )
                .await?
                .ok_or_else(|| DbError::conflict("OrderStatus", invoice_id))?;
                OrderStatus::Processing
            }
            other => other,
        };

        tx.commit().await?;

        info!(
            invoice_id,
            amount = payment.amount.rupiah(),
            status = %status,
            "Payment proof stored"
        );
        Ok(PaymentOutcome { payment, status })
    }
}
