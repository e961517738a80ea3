//! # toko-core: Pure Business Logic for Toko POS
//!
//! Everything the checkout engine decides without touching the database:
//! which status an order may move to next, how a supplier discount string
//! reduces a price, whether a quantity or address is acceptable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Toko POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Storefront (customer)          Counter (cashier)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (toko-server)                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ toko-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  status   │  │ discount  │  │   │
//! │  │   │  Invoice  │  │   Money   │  │ OrderType │  │  "10+5"   │  │   │
//! │  │   │  CartLine │  │  (rupiah) │  │ machine   │  │  stacked  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    toko-db (Database Layer)                     │   │
//! │  │        SQLite, migrations, checkout + cancellation engine       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Invoice, Payment, etc.)
//! - [`money`] - Integer rupiah amounts
//! - [`status`] - Order status state machine
//! - [`discount`] - Stacked supplier discounts
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use toko_core::{OrderStatus, OrderType};
//!
//! let next = OrderType::Pickup.next_status(OrderStatus::Processing);
//! assert_eq!(next, Some(OrderStatus::AwaitingPickup));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::StackedDiscount;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use status::{OrderStatus, OrderType};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart or checkout line.
///
/// Guards against typos at the counter (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price or supplier cost accepted, in rupiah (Rp1 triliun).
///
/// `MAX_PRICE * MAX_ITEM_QUANTITY * MAX_CART_ITEMS` fits in an `i64`, so
/// invoice totals built from validated prices cannot overflow.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// Hours an online order may stay unpaid before the sweep cancels it.
///
/// Used when the `settings` table has no value.
pub const DEFAULT_CANCELLATION_TIMEOUT_HOURS: i64 = 48;

/// Customer name recorded on counter sales without a registered customer.
pub const WALK_IN_CUSTOMER_NAME: &str = "Pelanggan Umum";
