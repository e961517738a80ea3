//! # Auto-Cancel Sweep
//!
//! Cancels orders that were never paid.
//!
//! ## Eligibility
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  status  = menunggu pembayaran                                          │
//! │  AND no payments row                                                    │
//! │  AND now - invoice.created_at > cancellation_timeout_hours (settings)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Candidates are listed once, then each one gets its own transaction that
//! re-checks status and payment before cancelling through the same path as
//! a manual cancel (status log + stock return). One invoice failing does
//! not stop the rest. Running the sweep again is a no-op for anything it
//! already cancelled.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::engine::status::apply_transition;
use crate::error::{DbError, DbResult};
use crate::repository::order_status::unpaid_candidates;
use crate::repository::payment::fetch_payment;
use crate::repository::settings::read_cancellation_timeout;
use toko_core::{OrderStatus, OrderType};

/// What one sweep run did.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub timeout_hours: i64,
    /// Unpaid orders looked at, due or not.
    pub examined: usize,
    pub cancelled: Vec<String>,
    /// Due, but paid or moved on before we got to them.
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AutoCancelSweep {
    pool: SqlitePool,
}

enum Outcome {
    Cancelled,
    Skipped,
}

impl AutoCancelSweep {
    pub fn new(pool: SqlitePool) -> Self {
        AutoCancelSweep { pool }
    }

    /// Runs one sweep against the current time.
    pub async fn run(&self) -> DbResult<SweepReport> {
        self.sweep_at(Utc::now()).await
    }

    /// Runs one sweep as if it were `now`.
    ///
    /// Fails only if the candidate list or the timeout setting cannot be
    /// read, or the timeout is out of range (`Corrupt`). Per-invoice
    /// failures are logged and reported in `failed`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> DbResult<SweepReport> {
        let (timeout_hours, candidates) = {
            let mut conn = self.pool.acquire().await?;
            let timeout_hours = read_cancellation_timeout(&mut conn).await?;
            (timeout_hours, unpaid_candidates(&mut conn).await?)
        };

        let cutoff = Duration::try_hours(timeout_hours)
            .and_then(|timeout| now.checked_sub_signed(timeout))
            .ok_or_else(|| {
                DbError::Corrupt(format!("cancellation timeout of {timeout_hours} hours"))
            })?;
        let mut report = SweepReport {
            timeout_hours,
            examined: candidates.len(),
            ..SweepReport::default()
        };

        for (invoice_id, order_type, created_at) in candidates {
            if created_at >= cutoff {
                continue;
            }

            match self.cancel_one(&invoice_id, order_type, now).await {
                Ok(Outcome::Cancelled) => report.cancelled.push(invoice_id),
                Ok(Outcome::Skipped) => {
                    debug!(%invoice_id, "Unpaid order changed before sweep, skipped");
                    report.skipped.push(invoice_id);
                }
                Err(e) => {
                    warn!(%invoice_id, error = %e, "Auto-cancel failed for invoice");
                    report.failed.push(invoice_id);
                }
            }
        }

        if !report.cancelled.is_empty() || !report.failed.is_empty() {
            info!(
                timeout_hours,
                examined = report.examined,
                cancelled = report.cancelled.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                "Auto-cancel sweep finished"
            );
        }

        Ok(report)
    }

    async fn cancel_one(
        &self,
        invoice_id: &str,
        order_type: OrderType,
        now: DateTime<Utc>,
    ) -> DbResult<Outcome> {
        let mut tx = self.pool.begin().await?;

        let transition = apply_transition(
            &mut tx,
            invoice_id,
            order_type,
            OrderStatus::AwaitingPayment,
            OrderStatus::Cancelled,
            None,
            now,
        )
        .await?;

        if transition.is_none() {
            return Ok(Outcome::Skipped);
        }

        // Paid between listing and now: dropping tx undoes the cancel.
        if fetch_payment(&mut tx, invoice_id).await?.is_some() {
            return Ok(Outcome::Skipped);
        }

        tx.commit().await?;
        info!(invoice_id, "Unpaid order auto-cancelled");
        Ok(Outcome::Cancelled)
    }
}
