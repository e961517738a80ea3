//! # Engine Module
//!
//! Operations that touch several tables and must be all-or-nothing.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate input          (no database access)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  first statement is a WRITE  ← takes SQLite's write lock, so no later  │
//! │       │                        read can go stale before we write       │
//! │       ▼                                                                 │
//! │  remaining reads + writes                                               │
//! │       │                                                                 │
//! │       ├── any Err(_) → transaction dropped → ROLLBACK                  │
//! │       ▼                                                                 │
//! │  COMMIT, then log                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`checkout`] - cart or explicit items → invoice
//! - [`status`] - status reads, transitions, cancellation
//! - [`reconcile`] - stock returned on cancellation
//! - [`payment`] - payment proof upload
//! - [`auto_cancel`] - sweep of unpaid orders
//! - [`supply`] - goods received from suppliers

pub mod auto_cancel;
pub mod checkout;
pub mod payment;
pub mod reconcile;
pub mod status;
pub mod supply;
