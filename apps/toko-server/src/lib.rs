//! # toko-server
//!
//! JSON-over-HTTP front for the Toko POS engine, plus the background task
//! that cancels unpaid online orders.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         toko-server                                     │
//! │                                                                         │
//! │  Storefront ─┐                                                         │
//! │              ├──► axum Router (routes/) ──► toko-db ──► SQLite          │
//! │  Counter ────┘                                 ▲                        │
//! │                                                │                        │
//! │                   Scheduler (every 60 s) ──────┘                        │
//! │                   auto_cancel().run()                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod scheduler;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use scheduler::{Scheduler, SchedulerHandle};
pub use state::AppState;
