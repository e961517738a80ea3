//! # Validation Module
//!
//! Input validation for Toko POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP deserialization (serde)                                 │
//! │  ├── Shapes and enum values                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Quantities, prices, addresses, identifiers                        │
//! │  └── Runs before the transaction opens                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (current_stock >= 0)                                        │
//! │  ├── UNIQUE (invoice_id) on status and payment rows                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::status::OrderType;
use crate::types::CheckoutLine;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Trims `value` and rejects it when empty or longer than `max` chars.
///
/// ```rust
/// use toko_core::validation::validate_required;
///
/// assert_eq!(validate_required("name", "  Budi ", 100).unwrap(), "Budi");
/// assert!(validate_required("name", "   ", 100).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value.to_string())
}

/// Validates a SKU: 1-50 chars of letters, digits, `-` and `_`.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = validate_required("sku", sku, 50)?;

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name, 200).map(|_| ())
}

/// Resolves the delivery address for an order.
///
/// Delivery needs a non-empty address. Pickup never stores one, so any
/// address sent with a pickup order is dropped.
///
/// ```rust
/// use toko_core::OrderType;
/// use toko_core::validation::validate_address;
///
/// assert!(validate_address(OrderType::Delivery, None).is_err());
/// assert_eq!(validate_address(OrderType::Pickup, Some("Jl. Mawar 1")).unwrap(), None);
/// ```
pub fn validate_address(
    order_type: OrderType,
    address: Option<&str>,
) -> ValidationResult<Option<String>> {
    match order_type {
        OrderType::Pickup => Ok(None),
        OrderType::Delivery => {
            let address = address.unwrap_or_default();
            validate_required("address", address, 500).map(Some)
        }
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity (1..=MAX_ITEM_QUANTITY).
///
/// ## Example
/// ```rust
/// use toko_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(10_000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Prices may be zero (free samples) but never negative or above
/// [`MAX_PRICE`].
pub fn validate_price(amount: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE).contains(&amount) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }
    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

pub fn validate_payment_amount(amount: i64) -> ValidationResult<()> {
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Cancellation timeout: 1 hour to 30 days.
pub fn validate_timeout_hours(hours: i64) -> ValidationResult<()> {
    if !(1..=720).contains(&hours) {
        return Err(ValidationError::OutOfRange {
            field: "cancellation_timeout_hours".to_string(),
            min: 1,
            max: 720,
        });
    }
    Ok(())
}

// =============================================================================
// Cart / Checkout Validators
// =============================================================================

/// Validates that adding one more distinct product keeps the cart in bounds.
pub fn validate_cart_size(current_lines: usize) -> CoreResult<()> {
    if current_lines >= MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }
    Ok(())
}

/// Normalizes checkout lines before any stock is touched.
///
/// - No lines: `EmptyCart`
/// - Duplicate products are merged, first-seen order kept
/// - Every merged quantity must pass [`validate_quantity`]
///
/// ```rust
/// use toko_core::CheckoutLine;
/// use toko_core::validation::normalize_checkout_lines;
///
/// let lines = normalize_checkout_lines(&[
///     CheckoutLine::new("a", 1),
///     CheckoutLine::new("b", 2),
///     CheckoutLine::new("a", 3),
/// ])
/// .unwrap();
/// assert_eq!(lines, vec![CheckoutLine::new("a", 4), CheckoutLine::new("b", 2)]);
/// ```
pub fn normalize_checkout_lines(lines: &[CheckoutLine]) -> CoreResult<Vec<CheckoutLine>> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let mut merged: Vec<CheckoutLine> = Vec::with_capacity(lines.len());
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in lines {
        validate_required("product_id", &line.product_id, 64)?;
        validate_quantity(line.quantity)?;

        match index.get(line.product_id.as_str()) {
            Some(&i) => merged[i].quantity += line.quantity,
            None => {
                index.insert(line.product_id.as_str(), merged.len());
                merged.push(line.clone());
            }
        }
    }

    for line in &merged {
        validate_quantity(line.quantity)?;
    }

    Ok(merged)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("BERAS-5KG").is_ok());
        assert!(validate_sku("minyak_1l").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("HAS SPACE").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_price_bounds() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(MAX_PRICE).is_ok());
        assert!(validate_price(-1).is_err());
        assert!(validate_price(MAX_PRICE + 1).is_err());

        // the largest order built from valid prices still fits
        let worst = MAX_PRICE
            .checked_mul(MAX_ITEM_QUANTITY)
            .and_then(|line| line.checked_mul(MAX_CART_ITEMS as i64));
        assert!(worst.is_some());
    }

    #[test]
    fn test_validate_address() {
        let err = validate_address(OrderType::Delivery, Some("   ")).unwrap_err();
        assert_eq!(err.field(), "address");
        assert_eq!(
            validate_address(OrderType::Delivery, Some(" Jl. Kenanga 5 ")).unwrap(),
            Some("Jl. Kenanga 5".to_string())
        );
        assert_eq!(validate_address(OrderType::Pickup, None).unwrap(), None);
    }

    #[test]
    fn test_validate_timeout_hours() {
        assert!(validate_timeout_hours(48).is_ok());
        assert!(validate_timeout_hours(0).is_err());
        assert!(validate_timeout_hours(721).is_err());
    }

    #[test]
    fn test_normalize_rejects_empty_and_bad_quantities() {
        assert!(matches!(normalize_checkout_lines(&[]), Err(CoreError::EmptyCart)));
        assert!(matches!(
            normalize_checkout_lines(&[CheckoutLine::new("a", 0)]),
            Err(CoreError::Validation(_))
        ));
        // merged total above the cap is rejected too
        assert!(normalize_checkout_lines(&[
            CheckoutLine::new("a", MAX_ITEM_QUANTITY),
            CheckoutLine::new("a", 1),
        ])
        .is_err());
    }

    #[test]
    fn test_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS - 1).is_ok());
        assert!(matches!(
            validate_cart_size(MAX_CART_ITEMS),
            Err(CoreError::CartTooLarge { .. })
        ));
    }
}
