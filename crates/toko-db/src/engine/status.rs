//! # Status Engine
//!
//! Order status reads and transitions, including cancellation.
//!
//! ## Transition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  read current status (outside the transaction)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  OrderType::check_transition(from, to)   TerminalState / Invalid...    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  UPDATE status SET status = to WHERE invoice_id = ? AND status = from  │
//! │       │  0 rows: someone moved it first → ROLLBACK, read again, retry  │
//! │       ▼                                                                 │
//! │  INSERT order_status_logs                                               │
//! │  to == dibatalkan → return stock                                        │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The compare-and-set is what makes cancellation refund at most once: of
//! two concurrent cancels only one can still find the old status, and the
//! retry of the other reads `dibatalkan` and fails with `TerminalState`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::engine::reconcile::return_stock;
use crate::error::{DbError, DbResult};
use crate::repository::order_status::{append_log, compare_and_set, fetch_history, fetch_status};
use crate::repository::people::fetch_cashier;
use toko_core::{CoreError, OrderStatus, OrderStatusRecord, OrderType, StatusLogEntry};

/// Attempts before a transition that keeps losing races gives up.
const MAX_ATTEMPTS: usize = 3;

/// A committed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub invoice_id: String,
    pub order_type: OrderType,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub cashier_id: Option<String>,
    /// Products whose stock was given back (cancellation only).
    pub restocked_products: u64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StatusEngine {
    pool: SqlitePool,
}

impl StatusEngine {
    pub fn new(pool: SqlitePool) -> Self {
        StatusEngine { pool }
    }

    /// Current status of an invoice.
    ///
    /// ## Errors
    /// * `InvoiceNotFound`
    pub async fn get_status(&self, invoice_id: &str) -> DbResult<OrderStatusRecord> {
        let mut conn = self.pool.acquire().await?;
        fetch_status(&mut conn, invoice_id)
            .await?
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()).into())
    }

    /// Moves an order one step forward, or to `dibatalkan`.
    ///
    /// ## Errors
    /// * `InvoiceNotFound`
    /// * `TerminalState` - order is `selesai` or `dibatalkan`
    /// * `InvalidTransition` - skip, backwards, self or wrong order type
    /// * `CashierNotFound` - `cashier_id` given but unknown
    pub async fn update_status(
        &self,
        invoice_id: &str,
        to: OrderStatus,
        cashier_id: Option<&str>,
    ) -> DbResult<Transition> {
        for attempt in 1..=MAX_ATTEMPTS {
            let current = self.get_status(invoice_id).await?;
            current
                .order_type
                .check_transition(invoice_id, current.status, to)?;

            let now = Utc::now();
            let mut tx = self.pool.begin().await?;

            match apply_transition(
                &mut tx,
                invoice_id,
                current.order_type,
                current.status,
                to,
                cashier_id,
                now,
            )
            .await?
            {
                Some(transition) => {
                    tx.commit().await?;
                    info!(
                        invoice_id,
                        from = %transition.from,
                        to = %transition.to,
                        cashier_id = ?transition.cashier_id,
                        "Order status changed"
                    );
                    return Ok(transition);
                }
                None => {
                    debug!(invoice_id, attempt, "Status changed concurrently, retrying");
                }
            }
        }

        Err(DbError::conflict("OrderStatus", invoice_id))
    }

    /// Cancels an order and returns its stock.
    ///
    /// Cancelling an order that is already `dibatalkan` is `TerminalState`
    /// and returns nothing a second time.
    pub async fn cancel_order(
        &self,
        invoice_id: &str,
        cashier_id: Option<&str>,
    ) -> DbResult<Transition> {
        self.update_status(invoice_id, OrderStatus::Cancelled, cashier_id)
            .await
    }

    /// Status log, oldest first.
    pub async fn history(&self, invoice_id: &str) -> DbResult<Vec<StatusLogEntry>> {
        let mut conn = self.pool.acquire().await?;
        if fetch_status(&mut conn, invoice_id).await?.is_none() {
            return Err(CoreError::InvoiceNotFound(invoice_id.to_string()).into());
        }
        fetch_history(&mut conn, invoice_id).await
    }
}

/// Writes one already-validated transition inside the caller's transaction.
///
/// The compare-and-set runs first so it is the statement that takes the
/// write lock. Returns `None`, having written nothing, when the status is
/// no longer `from`.
pub(crate) async fn apply_transition(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    order_type: OrderType,
    from: OrderStatus,
    to: OrderStatus,
    cashier_id: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<Option<Transition>> {
    if !compare_and_set(conn, invoice_id, order_type, from, to, cashier_id, now).await? {
        return Ok(None);
    }

    if let Some(id) = cashier_id {
        fetch_cashier(conn, id)
            .await?
            .ok_or_else(|| CoreError::CashierNotFound(id.to_string()))?;
    }

    append_log(conn, invoice_id, order_type, Some(from), to, cashier_id, now).await?;

    let restocked_products = if to == OrderStatus::Cancelled {
        return_stock(conn, invoice_id, now).await?
    } else {
        0
    };

    Ok(Some(Transition {
        invoice_id: invoice_id.to_string(),
        order_type,
        from,
        to,
        cashier_id: cashier_id.map(str::to_string),
        restocked_products,
        at: now,
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{customer_order, new_product, seed_people, stock_of, test_db};
    use crate::DbError;
    use toko_core::{CoreError, OrderStatus, OrderType};

    #[tokio::test]
    async fn test_pickup_happy_path_logs_every_step() {
        let db = test_db().await;
        let (customer, cashier) = seed_people(&db).await;
        let p = new_product(&db, "P", 1_000, 10).await;
        let receipt = customer_order(&db, &customer, OrderType::Pickup, &[(&p.id, 1)]).await;
        let id = receipt.invoice_id.as_str();

        for next in [
            OrderStatus::Processing,
            OrderStatus::AwaitingPickup,
            OrderStatus::Completed,
        ] {
            db.orders().update_status(id, next, Some(&cashier.id)).await.unwrap();
        }

        let status = db.orders().get_status(id).await.unwrap();
        assert_eq!(status.status, OrderStatus::Completed);
        assert_eq!(status.updated_by.as_deref(), Some(cashier.id.as_str()));
        assert_eq!(status.address, None);

        let log = db.orders().history(id).await.unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(log[3].previous_status, Some(OrderStatus::AwaitingPickup));
        assert_eq!(log[3].new_status, OrderStatus::Completed);
        assert_eq!(stock_of(&db, &p.id).await, 9);
    }

    #[tokio::test]
    async fn test_rejects_skips_and_other_order_type() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let p = new_product(&db, "P", 1_000, 10).await;
        let receipt = customer_order(&db, &customer, OrderType::Pickup, &[(&p.id, 1)]).await;
        let id = receipt.invoice_id.as_str();

        for bad in [
            OrderStatus::Completed,
            OrderStatus::Delivering,
            OrderStatus::AwaitingPayment,
        ] {
            assert!(matches!(
                db.orders().update_status(id, bad, None).await,
                Err(DbError::Domain(CoreError::InvalidTransition { .. }))
            ));
        }
        assert_eq!(db.orders().history(id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_states_are_final() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let p = new_product(&db, "P", 1_000, 10).await;
        let receipt = customer_order(&db, &customer, OrderType::Delivery, &[(&p.id, 1)]).await;
        let id = receipt.invoice_id.as_str();

        db.orders().cancel_order(id, None).await.unwrap();
        let err = db
            .orders()
            .update_status(id, OrderStatus::Processing, None)
            .await
            .unwrap_err();
        match err {
            DbError::Domain(CoreError::TerminalState {
                invoice_id,
                current_status,
            }) => {
                assert_eq!(invoice_id, id);
                assert_eq!(current_status, OrderStatus::Cancelled);
            }
            other => panic!("expected TerminalState, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_double_cancel_refunds_once() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let p = new_product(&db, "P", 1_000, 10).await;
        let receipt = customer_order(&db, &customer, OrderType::Pickup, &[(&p.id, 4)]).await;
        assert_eq!(stock_of(&db, &p.id).await, 6);

        let first = db.orders().cancel_order(&receipt.invoice_id, None).await.unwrap();
        assert_eq!(first.restocked_products, 1);
        assert_eq!(stock_of(&db, &p.id).await, 10);

        assert!(matches!(
            db.orders().cancel_order(&receipt.invoice_id, None).await,
            Err(DbError::Domain(CoreError::TerminalState { .. }))
        ));
        assert_eq!(stock_of(&db, &p.id).await, 10);
    }

    #[tokio::test]
    async fn test_checkout_then_cancel_restores_all_stock() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let a = new_product(&db, "A", 1_000, 7).await;
        let b = new_product(&db, "B", 2_000, 3).await;
        let c = new_product(&db, "C", 3_000, 12).await;

        let receipt = customer_order(
            &db,
            &customer,
            OrderType::Delivery,
            &[(&a.id, 7), (&b.id, 1), (&c.id, 5)],
        )
        .await;
        assert_eq!(stock_of(&db, &a.id).await, 0);

        db.orders().cancel_order(&receipt.invoice_id, None).await.unwrap();
        assert_eq!(stock_of(&db, &a.id).await, 7);
        assert_eq!(stock_of(&db, &b.id).await, 3);
        assert_eq!(stock_of(&db, &c.id).await, 12);

        let log = db.orders().history(&receipt.invoice_id).await.unwrap();
        assert_eq!(log.last().unwrap().new_status, OrderStatus::Cancelled);
        assert_eq!(log.last().unwrap().cashier_id, None);
    }

    #[tokio::test]
    async fn test_unknown_cashier_rolls_back_transition() {
        let db = test_db().await;
        let (customer, _) = seed_people(&db).await;
        let p = new_product(&db, "P", 1_000, 10).await;
        let receipt = customer_order(&db, &customer, OrderType::Pickup, &[(&p.id, 2)]).await;

        assert!(matches!(
            db.orders().cancel_order(&receipt.invoice_id, Some("ghost")).await,
            Err(DbError::Domain(CoreError::CashierNotFound(_)))
        ));
        let status = db.orders().get_status(&receipt.invoice_id).await.unwrap();
        assert_eq!(status.status, OrderStatus::AwaitingPayment);
        assert_eq!(stock_of(&db, &p.id).await, 8);
    }

    #[tokio::test]
    async fn test_unknown_invoice() {
        let db = test_db().await;
        assert!(matches!(
            db.orders().get_status("nope").await,
            Err(DbError::Domain(CoreError::InvoiceNotFound(_)))
        ));
        assert!(matches!(
            db.orders().history("nope").await,
            Err(DbError::Domain(CoreError::InvoiceNotFound(_)))
        ));
    }
}
