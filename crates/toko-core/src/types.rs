//! # Domain Types
//!
//! Core domain types used throughout Toko POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Actor (customer | cashier) ──owns──► CartLine*                        │
//! │       │                                                                 │
//! │       │ checkout                                                        │
//! │       ▼                                                                 │
//! │  Invoice ──1:N──► InvoiceDetail   (name/unit/image/price snapshot)     │
//! │     │                                                                   │
//! │     ├──1:1──► OrderStatusRecord ──1:N──► StatusLogEntry                │
//! │     └──0:1──► Payment                                                  │
//! │                                                                         │
//! │  Product ──1:N──► PricingLogEntry                                      │
//! │  Supplier ──1:N──► SupplyInvoice ──1:N──► SupplyInvoiceLine            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entity ids are UUID v4 strings. Invoices also get a human-readable
//! `invoice_number` for receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::status::{OrderStatus, OrderType};

// =============================================================================
// Actors
// =============================================================================

/// Which side of the shop an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ActorKind {
    /// Shopping online through the storefront.
    Customer,
    /// Operating the counter.
    Cashier,
}

impl ActorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Customer => "customer",
            ActorKind::Cashier => "cashier",
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The person placing an order. Also identifies whose cart is meant:
/// customers and cashiers have separate carts that never mix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
#[ts(export)]
pub enum Actor {
    Customer(String),
    Cashier(String),
}

impl Actor {
    pub fn new(kind: ActorKind, id: impl Into<String>) -> Self {
        match kind {
            ActorKind::Customer => Actor::Customer(id.into()),
            ActorKind::Cashier => Actor::Cashier(id.into()),
        }
    }

    pub fn kind(&self) -> ActorKind {
        match self {
            Actor::Customer(_) => ActorKind::Customer,
            Actor::Cashier(_) => ActorKind::Cashier,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Actor::Customer(id) | Actor::Cashier(id) => id,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A registered storefront customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Phone or WhatsApp number.
    pub contact: Option<String>,
    /// Default delivery address.
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Cashier {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown in the storefront and on invoices.
    pub name: String,

    /// Selling unit ("pcs", "kg", "dus", ...).
    pub unit: String,

    /// Reference to the product image in the upload store.
    pub image: Option<String>,

    /// Current selling price.
    pub price: Money,

    /// Units on the shelf. Never negative.
    pub current_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` units can come off the shelf.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        self.is_active && self.current_stock >= quantity
    }
}

/// Fields for a new product. Id and timestamps are assigned on insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub image: Option<String>,
    pub price: Money,
    pub initial_stock: i64,
}

/// One row of a product's price history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricingLogEntry {
    pub id: i64,
    pub product_id: String,
    pub old_price: Money,
    pub new_price: Money,
    #[ts(as = "String")]
    pub changed_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// One product in an actor's cart, priced at the current shelf price.
///
/// Cart rows only hold (owner, product, quantity). Name and price are read
/// live from the product, so a price change shows up in the cart at once.
/// The price is frozen only at checkout, in [`InvoiceDetail`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit: String,
    pub image: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    /// `unit_price × quantity`
    pub subtotal: Money,
    /// Stock at the time the cart was listed.
    pub available_stock: i64,
}

/// The whole cart as returned by `List`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSummary {
    pub owner: Actor,
    pub lines: Vec<CartLine>,
    pub item_count: i64,
    pub total: Money,
}

impl CartSummary {
    pub fn new(owner: Actor, lines: Vec<CartLine>) -> Self {
        let item_count = lines.iter().map(|l| l.quantity).sum();
        let total = lines.iter().map(|l| l.subtotal).sum();
        CartSummary {
            owner,
            lines,
            item_count,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentOption {
    /// Cash at the counter.
    #[serde(alias = "tunai")]
    Cash,
    /// Bank transfer, proven by an uploaded receipt image.
    Transfer,
}

/// A product and quantity to buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CheckoutLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CheckoutLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Everything about a checkout except the actor and the items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutOptions {
    /// Pickup or delivery.
    pub shipping_option: OrderType,
    pub payment_option: PaymentOption,
    /// Required for delivery, ignored for pickup.
    #[serde(default)]
    pub address: Option<String>,
    /// Counter sales: name to print on the invoice.
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_contact: Option<String>,
    /// Counter sales: a registered customer buying in person.
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl CheckoutOptions {
    pub fn new(shipping_option: OrderType, payment_option: PaymentOption) -> Self {
        CheckoutOptions {
            shipping_option,
            payment_option,
            address: None,
            customer_name: None,
            customer_contact: None,
            customer_id: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_customer_id(mut self, id: impl Into<String>) -> Self {
        self.customer_id = Some(id.into());
        self
    }
}

/// A checkout with explicit items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutRequest {
    pub actor: Actor,
    pub items: Vec<CheckoutLine>,
    #[serde(flatten)]
    pub options: CheckoutOptions,
}

/// What a successful checkout hands back.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutReceipt {
    pub invoice_id: String,
    pub invoice_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub total: Money,
}

// =============================================================================
// Invoice
// =============================================================================

/// A committed order. Never modified after checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Receipt number, e.g. `INV-20260118-3FA2C9D1`.
    pub invoice_number: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub order_type: OrderType,
    pub payment_option: PaymentOption,
    /// Set for counter sales.
    pub cashier_id: Option<String>,
    pub cashier_name: Option<String>,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One invoice line, with the product as it was at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceDetail {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_unit: String,
    pub product_image: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
}

impl InvoiceDetail {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// The single current-status row of an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderStatusRecord {
    pub invoice_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Delivery orders only.
    pub address: Option<String>,
    /// Cashier who made the last change, if any.
    pub updated_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row, one per status write.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusLogEntry {
    pub id: i64,
    pub invoice_id: String,
    pub order_type: OrderType,
    /// `None` on the row written at checkout.
    pub previous_status: Option<OrderStatus>,
    pub new_status: OrderStatus,
    /// `None` for customer and scheduler actions.
    pub cashier_id: Option<String>,
    #[ts(as = "String")]
    pub logged_at: DateTime<Utc>,
}

/// Invoice, lines and current status in one view.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderView {
    pub invoice: Invoice,
    pub details: Vec<InvoiceDetail>,
    pub status: OrderStatusRecord,
    pub payment: Option<Payment>,
}

// =============================================================================
// Payment
// =============================================================================

/// Proof of payment for an invoice. At most one per invoice; a re-upload
/// replaces it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    pub amount: Money,
    /// Reference to the uploaded transfer receipt. `None` for cash.
    pub proof_image: Option<String>,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Payment proof submitted by a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentProof {
    pub amount: Money,
    #[serde(default)]
    pub proof_image: Option<String>,
}

// =============================================================================
// Supplier purchasing
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub contact: Option<String>,
}

/// Goods received from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplyInvoice {
    pub id: String,
    pub supplier_id: String,
    /// The supplier's own invoice number, or a generated one.
    pub invoice_number: String,
    pub total: Money,
    #[ts(as = "String")]
    pub supplied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplyInvoiceLine {
    pub id: String,
    pub supply_invoice_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
    /// Discount exactly as written on the supplier invoice ("10+5").
    pub discount: String,
    /// `quantity × unit_cost` after the stacked discount.
    pub line_total: Money,
}

/// One line of an incoming supplier invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplyLineRequest {
    pub product_id: String,
    pub quantity: i64,
    pub unit_cost: Money,
    #[serde(default)]
    pub discount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SupplyInvoiceRequest {
    pub supplier_id: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub lines: Vec<SupplyLineRequest>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_accessors() {
        let actor = Actor::new(ActorKind::Cashier, "k-1");
        assert_eq!(actor.kind(), ActorKind::Cashier);
        assert_eq!(actor.id(), "k-1");
        assert_eq!(actor.to_string(), "cashier:k-1");
    }

    #[test]
    fn test_actor_json_shape() {
        let json = serde_json::to_value(Actor::Customer("c-1".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "customer", "id": "c-1"}));
    }

    #[test]
    fn test_cart_summary_totals() {
        let line = |id: &str, price: i64, qty: i64| CartLine {
            product_id: id.to_string(),
            name: id.to_string(),
            unit: "pcs".to_string(),
            image: None,
            unit_price: Money::from_rupiah(price),
            quantity: qty,
            subtotal: Money::from_rupiah(price * qty),
            available_stock: 10,
        };

        let summary = CartSummary::new(
            Actor::Customer("c".into()),
            vec![line("a", 3_000, 2), line("b", 12_500, 1)],
        );
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total, Money::from_rupiah(18_500));

        let empty = CartSummary::new(Actor::Cashier("k".into()), vec![]);
        assert!(empty.is_empty());
        assert!(empty.total.is_zero());
    }

    #[test]
    fn test_checkout_options_accept_indonesian_aliases() {
        let options: CheckoutOptions = serde_json::from_value(serde_json::json!({
            "shippingOption": "diantar",
            "paymentOption": "tunai",
            "address": "Jl. Merdeka 10"
        }))
        .unwrap();
        assert_eq!(options.shipping_option, OrderType::Delivery);
        assert_eq!(options.payment_option, PaymentOption::Cash);
        assert!(options.customer_id.is_none());
    }
}
