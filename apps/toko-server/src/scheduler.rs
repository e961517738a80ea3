//! # Auto-Cancel Scheduler
//!
//! Runs the unpaid-order sweep on a fixed interval until shutdown.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start() ──► spawned task                                              │
//! │                 │                                                       │
//! │                 ├── interval.tick()  ──► db.auto_cancel().run()         │
//! │                 │                        (first tick fires at once)     │
//! │                 ├── SweepNow         ──► same, report sent back         │
//! │                 └── Shutdown / all handles dropped ──► exit loop        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed sweep is logged and the loop carries on; the next tick retries.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use toko_db::{Database, DbError, SweepReport};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler is not running")]
    Stopped,

    #[error(transparent)]
    Database(#[from] DbError),
}

#[derive(Debug)]
enum SchedulerCommand {
    SweepNow(oneshot::Sender<Result<SweepReport, DbError>>),
    Shutdown,
}

/// Handle to a running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    cmd_tx: mpsc::Sender<SchedulerCommand>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Runs a sweep immediately, outside the regular interval.
    pub async fn sweep_now(&self) -> Result<SweepReport, SchedulerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(SchedulerCommand::SweepNow(reply_tx))
            .await
            .map_err(|_| SchedulerError::Stopped)?;
        let report = reply_rx.await.map_err(|_| SchedulerError::Stopped)??;
        Ok(report)
    }

    /// Stops the loop and waits for an in-flight sweep to finish.
    pub async fn shutdown(self) {
        if self.cmd_tx.send(SchedulerCommand::Shutdown).await.is_err() {
            debug!("Scheduler already stopped");
        }
        if let Err(e) = self.task.await {
            error!(error = %e, "Scheduler task panicked");
        }
    }
}

pub struct Scheduler {
    db: Database,
    every: Duration,
}

impl Scheduler {
    pub fn new(db: Database, every: Duration) -> Self {
        Scheduler { db, every }
    }

    /// Spawns the loop and returns its handle.
    pub fn start(self) -> SchedulerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let task = tokio::spawn(async move {
            self.run(cmd_rx).await;
        });
        SchedulerHandle { cmd_tx, task }
    }

    async fn run(self, mut cmd_rx: mpsc::Receiver<SchedulerCommand>) {
        info!(interval_secs = self.every.as_secs(), "Auto-cancel scheduler started");

        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(SchedulerCommand::SweepNow(reply)) => {
                        let result = self.db.auto_cancel().run().await;
                        // requester may have gone away
                        let _ = reply.send(result);
                    }
                    Some(SchedulerCommand::Shutdown) | None => {
                        info!("Auto-cancel scheduler shutting down");
                        break;
                    }
                },
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    async fn sweep(&self) {
        match self.db.auto_cancel().run().await {
            Ok(report) => {
                debug!(
                    examined = report.examined,
                    cancelled = report.cancelled.len(),
                    "Auto-cancel tick"
                );
            }
            Err(e) => {
                error!(error = %e, "Auto-cancel sweep failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toko_core::{Actor, CheckoutLine, CheckoutOptions, CheckoutRequest, Money, NewProduct};
    use toko_core::{OrderStatus, OrderType, PaymentOption};
    use toko_db::DbConfig;

    #[tokio::test]
    async fn test_sweep_now_leaves_fresh_orders_alone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = db.customers().insert("Dewi", None, None).await.unwrap();
        let product = db
            .products()
            .insert(&NewProduct {
                sku: "GLA-01".into(),
                name: "Gula Pasir 1 kg".into(),
                unit: "kg".into(),
                image: None,
                price: Money::from_rupiah(16_500),
                initial_stock: 5,
            })
            .await
            .unwrap();
        let receipt = db
            .checkout()
            .checkout(&CheckoutRequest {
                actor: Actor::Customer(customer.id.clone()),
                items: vec![CheckoutLine::new(&product.id, 2)],
                options: CheckoutOptions::new(OrderType::Pickup, PaymentOption::Transfer),
            })
            .await
            .unwrap();

        let handle = Scheduler::new(db.clone(), Duration::from_secs(3600)).start();
        let report = handle.sweep_now().await.unwrap();

        assert_eq!(report.examined, 1);
        assert!(report.cancelled.is_empty());
        assert_eq!(
            db.orders().get_status(&receipt.invoice_id).await.unwrap().status,
            OrderStatus::AwaitingPayment
        );

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_loop() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let handle = Scheduler::new(db, Duration::from_secs(1)).start();
        let cmd_tx = handle.cmd_tx.clone();

        handle.shutdown().await;
        assert!(cmd_tx.is_closed());
    }
}
