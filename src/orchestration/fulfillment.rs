//! Fulfillment state machine over persisted orders.

use crate::db::Repository;
use crate::domain::{OrderId, OrderStatus, StallId};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Success outcomes of a transition request.
///
/// `AlreadyInTarget` makes the operation safely retriable: a client that does
/// not know whether its previous request landed can simply resend it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status moved to the target.
    Updated(OrderStatus),
    /// The order was already in the target status; nothing changed.
    AlreadyInTarget(OrderStatus),
}

impl TransitionOutcome {
    pub fn status(&self) -> OrderStatus {
        match self {
            TransitionOutcome::Updated(s) | TransitionOutcome::AlreadyInTarget(s) => *s,
        }
    }
}

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error("illegal status transition from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
    #[error("status changed by another actor")]
    Conflict,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Drives orders through their lifecycle under concurrent admin updates.
///
/// Transitions are optimistic: the write is conditional on the status still
/// being the one observed, and a lost race surfaces as [`FulfillmentError::Conflict`]
/// for the caller to re-read — never silently overwritten, never auto-retried.
#[derive(Clone)]
pub struct Fulfillment {
    repo: Arc<Repository>,
}

impl Fulfillment {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Move an order owned by `requesting_stall` to `target`.
    ///
    /// An order belonging to another stall is reported as not found. The
    /// legality of the move is decided by [`OrderStatus::allowed_next`].
    ///
    /// # Errors
    /// See [`FulfillmentError`].
    pub async fn transition(
        &self,
        order_id: &OrderId,
        target: OrderStatus,
        requesting_stall: &StallId,
    ) -> Result<TransitionOutcome, FulfillmentError> {
        let order = self
            .repo
            .get_order_for_stall(order_id, requesting_stall)
            .await?
            .ok_or_else(|| FulfillmentError::OrderNotFound(order_id.to_string()))?;

        if order.status == target {
            return Ok(TransitionOutcome::AlreadyInTarget(target));
        }
        if !order.status.can_transition_to(target) {
            return Err(FulfillmentError::IllegalTransition {
                from: order.status,
                to: target,
            });
        }

        if self
            .repo
            .cas_order_status(order_id, order.status, target)
            .await?
        {
            info!(
                order = order_id.as_str(),
                from = %order.status,
                to = %target,
                "order status updated"
            );
            Ok(TransitionOutcome::Updated(target))
        } else {
            Err(FulfillmentError::Conflict)
        }
    }
}
