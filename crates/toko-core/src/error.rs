//! # Error Types
//!
//! Domain-specific error types for toko-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  toko-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  toko-db errors (separate crate)                                       │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  toko-server errors (in app)                                           │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant here is a user-facing reason: the HTTP layer passes the
//! message through unchanged. Infrastructure failures never appear here.

use thiserror::Error;

use crate::status::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart, checkout and status engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Checkout was attempted with no line items.
    #[error("Cart is empty")]
    EmptyCart,

    /// A checkout line asked for more than is on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout: beras 5kg × 3
    ///      │
    ///      ▼
    /// UPDATE products SET current_stock = current_stock - 3
    ///   WHERE id = ? AND current_stock >= 3      → 0 rows
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, requested: 3, available: 2 }
    ///      │
    ///      ▼
    /// Whole checkout rolled back, cart untouched
    /// ```
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// A cart edit would put more in the cart than is in stock.
    #[error("Quantity {requested} for product {product_id} exceeds stock ({available})")]
    StockExceeded {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Product does not exist or is inactive.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Cashier not found: {0}")]
    CashierNotFound(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// The order is already `selesai` or `dibatalkan`.
    ///
    /// This is also what stops a second cancellation from returning the
    /// stock twice.
    #[error("Invoice {invoice_id} is already {current_status}")]
    TerminalState {
        invoice_id: String,
        current_status: OrderStatus,
    },

    /// The requested status is not the next step for this order type.
    #[error("Invoice {invoice_id} cannot move from {from} to {to}")]
    InvalidTransition {
        invoice_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Cart has reached the maximum number of distinct products.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// A supplier discount string could not be parsed.
    #[error("Invalid discount '{input}': {reason}")]
    InvalidDiscount { input: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for the "something with this id does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_)
                | CoreError::CustomerNotFound(_)
                | CoreError::CashierNotFound(_)
                | CoreError::InvoiceNotFound(_)
                | CoreError::SupplierNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database write so a rejected request leaves no trace.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// An invoice total that does not fit in whole rupiah.
    pub fn total_out_of_range() -> Self {
        ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            requested: 5,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: requested 5, available 3"
        );

        let err = CoreError::TerminalState {
            invoice_id: "inv-1".to_string(),
            current_status: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Invoice inv-1 is already dibatalkan");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = CoreError::InvalidTransition {
            invoice_id: "inv-9".to_string(),
            from: OrderStatus::AwaitingPayment,
            to: OrderStatus::Completed,
        };
        assert_eq!(
            err.to_string(),
            "Invoice inv-9 cannot move from menunggu pembayaran to selesai"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("address");
        assert_eq!(err.to_string(), "address is required");
        assert_eq!(err.field(), "address");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("quantity").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
        assert!(CoreError::CashierNotFound("k".into()).is_not_found());
    }
}
