//! Orders, order lines, and the fulfillment status lifecycle.

use crate::domain::{AccountId, Decimal, ItemId, OrderId, StallId, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fulfillment status of an order.
///
/// Movement is governed by [`OrderStatus::allowed_next`]; `Delivered` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingConfirmation,
    Cooking,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Statuses legally reachable from this one.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::AwaitingConfirmation => {
                &[OrderStatus::Cooking, OrderStatus::Cancelled]
            }
            OrderStatus::Cooking => &[OrderStatus::OutForDelivery, OrderStatus::Cancelled],
            OrderStatus::OutForDelivery => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    /// True if `target` is a legal next status.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.allowed_next().contains(&target)
    }

    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Stable string form used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingConfirmation => "awaiting_confirmation",
            OrderStatus::Cooking => "cooking",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_confirmation" => Ok(OrderStatus::AwaitingConfirmation),
            "cooking" => Ok(OrderStatus::Cooking),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// How an order is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Prepaid wallet balance, debited at checkout.
    Wallet,
    /// Settled at the stall; no ledger movement.
    Cash,
}

/// Error returned when parsing an unknown payment method string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment method: {0}")]
pub struct ParsePaymentError(pub String);

impl FromStr for PaymentMethod {
    type Err = ParsePaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wallet" => Ok(PaymentMethod::Wallet),
            "cash" => Ok(PaymentMethod::Cash),
            other => Err(ParsePaymentError(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Wallet => write!(f, "wallet"),
            PaymentMethod::Cash => write!(f, "cash"),
        }
    }
}

/// One checkout transaction by one account against one stall.
///
/// `status` is the only field that changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub stall_id: StallId,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: TimeMs,
}

/// One item + quantity within an order.
///
/// `unit_price` is frozen at creation and never recomputed from the current
/// catalog or discount state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub item_id: ItemId,
    pub qty: i64,
    pub unit_price: Decimal,
}

impl OrderLine {
    /// qty * unit_price; the unit price is already rounded.
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.qty) * self.unit_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        assert!(AwaitingConfirmation.can_transition_to(Cooking));
        assert!(AwaitingConfirmation.can_transition_to(Cancelled));
        assert!(!AwaitingConfirmation.can_transition_to(OutForDelivery));
        assert!(!AwaitingConfirmation.can_transition_to(Delivered));

        assert!(Cooking.can_transition_to(OutForDelivery));
        assert!(Cooking.can_transition_to(Cancelled));
        assert!(!Cooking.can_transition_to(Delivered));
        assert!(!Cooking.can_transition_to(AwaitingConfirmation));

        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(!OutForDelivery.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_allow_nothing() {
        use OrderStatus::*;

        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        for target in [AwaitingConfirmation, Cooking, OutForDelivery, Delivered, Cancelled] {
            assert!(!Delivered.can_transition_to(target));
            assert!(!Cancelled.can_transition_to(target));
        }
    }

    #[test]
    fn test_status_string_roundtrip() {
        use OrderStatus::*;

        for status in [AwaitingConfirmation, Cooking, OutForDelivery, Delivered, Cancelled] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("confirmed".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("wallet".parse::<PaymentMethod>().unwrap(), PaymentMethod::Wallet);
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_line_subtotal() {
        let line = OrderLine {
            order_id: OrderId::new("o1".to_string()),
            item_id: ItemId::new("i1".to_string()),
            qty: 2,
            unit_price: Decimal::from_cents(1_350_000),
        };
        assert_eq!(line.subtotal(), Decimal::from_cents(2_700_000));
    }
}
