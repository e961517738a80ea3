//! # toko-db: Database Layer for Toko POS
//!
//! SQLite storage plus the transactional engine that keeps stock, invoices
//! and order statuses consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Toko POS Data Flow                               │
//! │                                                                         │
//! │  HTTP handler / auto-cancel scheduler                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     toko-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │   Database    │   │    engine/     │   │ repository/   │   │   │
//! │  │   │   (pool.rs)   │──►│ checkout       │──►│ product, cart │   │   │
//! │  │   │               │   │ status+cancel  │   │ invoice,      │   │   │
//! │  │   │  SqlitePool   │   │ payment        │   │ order_status, │   │   │
//! │  │   │  migrations   │   │ auto_cancel    │   │ payment, ...  │   │   │
//! │  │   │               │   │ supply         │   │               │   │   │
//! │  │   └───────────────┘   └────────────────┘   └───────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Single-table reads and writes
//! - [`engine`] - Multi-table operations, one transaction each
//!
//! ## Usage
//!
//! ```rust,ignore
//! use toko_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("toko.db")).await?;
//! db.carts().add_item(&actor, &product_id, 2).await?;
//! let receipt = db.checkout().checkout_cart(&actor, options).await?;
//! ```

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use engine::auto_cancel::{AutoCancelSweep, SweepReport};
pub use engine::checkout::CheckoutEngine;
pub use engine::payment::{PaymentEngine, PaymentOutcome};
pub use engine::status::{StatusEngine, Transition};
pub use engine::supply::{SupplyEngine, SupplyReceipt};
pub use repository::cart::CartRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::people::{CashierRepository, CustomerRepository};
pub use repository::product::ProductRepository;
pub use repository::settings::SettingsRepository;
pub use repository::supplier::SupplierRepository;
