//! # Order Status State Machine
//!
//! Every invoice carries exactly one status row, whose allowed values
//! depend on how the goods leave the shop.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PICKUP    menunggu pembayaran ─► diproses ─► menunggu pengambilan ─►   │
//! │                                                          selesai        │
//! │                                                                         │
//! │  DELIVERY  menunggu pembayaran ─► diproses ─► diantar ─► selesai        │
//! │                                                                         │
//! │  Any non-terminal status ─► dibatalkan                                 │
//! │                                                                         │
//! │  selesai, dibatalkan: terminal, nothing leaves them                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Forward moves are one step at a time. The stored strings are the
//! Indonesian labels the shop staff see, so they double as the wire format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::ActorKind;

// =============================================================================
// Order Status
// =============================================================================

/// Status of an order (invoice) in its fulfilment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum OrderStatus {
    /// Online order placed, waiting for the customer's transfer proof.
    #[serde(rename = "menunggu pembayaran")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "menunggu pembayaran"))]
    AwaitingPayment,

    /// Paid, being packed.
    #[serde(rename = "diproses")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "diproses"))]
    Processing,

    /// Pickup orders only: packed and waiting at the counter.
    #[serde(rename = "menunggu pengambilan")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "menunggu pengambilan"))]
    AwaitingPickup,

    /// Delivery orders only: out with the courier.
    #[serde(rename = "diantar")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "diantar"))]
    Delivering,

    #[serde(rename = "selesai")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "selesai"))]
    Completed,

    #[serde(rename = "dibatalkan")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "dibatalkan"))]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::AwaitingPayment,
        OrderStatus::Processing,
        OrderStatus::AwaitingPickup,
        OrderStatus::Delivering,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// The label stored in the database and shown to staff.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "menunggu pembayaran",
            OrderStatus::Processing => "diproses",
            OrderStatus::AwaitingPickup => "menunggu pengambilan",
            OrderStatus::Delivering => "diantar",
            OrderStatus::Completed => "selesai",
            OrderStatus::Cancelled => "dibatalkan",
        }
    }

    /// `selesai` and `dibatalkan` accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Order Type
// =============================================================================

/// How the order reaches the customer. Chosen at checkout as the
/// shipping option and fixed for the life of the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderType {
    /// Customer collects at the shop.
    #[serde(alias = "ambil", alias = "diambil")]
    Pickup,
    /// Shop sends the goods to an address.
    #[serde(alias = "diantar", alias = "antar")]
    Delivery,
}

const PICKUP_PATH: [OrderStatus; 4] = [
    OrderStatus::AwaitingPayment,
    OrderStatus::Processing,
    OrderStatus::AwaitingPickup,
    OrderStatus::Completed,
];

const DELIVERY_PATH: [OrderStatus; 4] = [
    OrderStatus::AwaitingPayment,
    OrderStatus::Processing,
    OrderStatus::Delivering,
    OrderStatus::Completed,
];

impl OrderType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderType::Pickup => "pickup",
            OrderType::Delivery => "delivery",
        }
    }

    /// The happy path for this order type, in order.
    pub const fn path(&self) -> &'static [OrderStatus] {
        match self {
            OrderType::Pickup => &PICKUP_PATH,
            OrderType::Delivery => &DELIVERY_PATH,
        }
    }

    /// True when `status` can ever appear on an order of this type.
    pub fn accepts(&self, status: OrderStatus) -> bool {
        status == OrderStatus::Cancelled || self.path().contains(&status)
    }

    /// The next forward step from `current`, if any.
    ///
    /// ```rust
    /// use toko_core::{OrderStatus, OrderType};
    ///
    /// assert_eq!(
    ///     OrderType::Delivery.next_status(OrderStatus::Processing),
    ///     Some(OrderStatus::Delivering)
    /// );
    /// assert_eq!(OrderType::Delivery.next_status(OrderStatus::Completed), None);
    /// ```
    pub fn next_status(&self, current: OrderStatus) -> Option<OrderStatus> {
        let path = self.path();
        path.iter()
            .position(|s| *s == current)
            .and_then(|idx| path.get(idx + 1))
            .copied()
    }

    /// Status written when the invoice is created.
    ///
    /// Online orders wait for payment. Counter sales are paid in cash on the
    /// spot: pickup is handed over immediately, delivery still has to be
    /// packed and sent.
    pub const fn initial_status(&self, placed_by: ActorKind) -> OrderStatus {
        match (placed_by, self) {
            (ActorKind::Customer, _) => OrderStatus::AwaitingPayment,
            (ActorKind::Cashier, OrderType::Pickup) => OrderStatus::Completed,
            (ActorKind::Cashier, OrderType::Delivery) => OrderStatus::Processing,
        }
    }

    /// Checks that `invoice_id` may move from `from` to `to`.
    ///
    /// ## Errors
    /// * `TerminalState` when `from` is `selesai` or `dibatalkan`
    /// * `InvalidTransition` for skips, backward moves, self-moves and
    ///   statuses that belong to the other order type
    pub fn check_transition(
        &self,
        invoice_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> CoreResult<()> {
        if from.is_terminal() {
            return Err(CoreError::TerminalState {
                invoice_id: invoice_id.to_string(),
                current_status: from,
            });
        }

        if to == OrderStatus::Cancelled || self.next_status(from) == Some(to) {
            return Ok(());
        }

        Err(CoreError::InvalidTransition {
            invoice_id: invoice_id.to_string(),
            from,
            to,
        })
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pickup" | "ambil" | "diambil" => Ok(OrderType::Pickup),
            "delivery" | "antar" | "diantar" => Ok(OrderType::Delivery),
            _ => Err(ValidationError::NotAllowed {
                field: "shipping_option".to_string(),
                allowed: vec!["pickup".to_string(), "delivery".to_string()],
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
