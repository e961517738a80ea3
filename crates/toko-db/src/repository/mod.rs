//! # Repository Module
//!
//! Database access for single entities.
//!
//! ## Two kinds of functions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  XxxRepository methods         pub(crate) fns taking &mut Connection   │
//! │  ─────────────────────         ─────────────────────────────────────    │
//! │  own a pool clone              run inside someone else's transaction    │
//! │  one statement / short tx      never commit, never open a tx            │
//! │  used by handlers directly     used by the engine/ modules              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Products, stock, price history
//! - [`people::CustomerRepository`], [`people::CashierRepository`]
//! - [`supplier::SupplierRepository`] - Suppliers and received goods
//! - [`cart::CartRepository`] - Customer and cashier carts
//! - [`invoice::InvoiceRepository`] - Committed invoices
//! - [`settings::SettingsRepository`] - Runtime settings
//! - [`order_status`], [`payment`] - transaction helpers only

pub mod cart;
pub mod invoice;
pub mod order_status;
pub mod payment;
pub mod people;
pub mod product;
pub mod settings;
pub mod supplier;
