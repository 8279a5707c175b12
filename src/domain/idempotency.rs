//! Idempotency deduplication record.

use crate::domain::{AccountId, OrderId, TimeMs};

/// A client-supplied deduplication token scoped to one account.
///
/// Unresolved until linked to the order it produced; stale unresolved records
/// are reclaimable after a bounded timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyRecord {
    pub token: String,
    pub account_id: AccountId,
    pub order_id: Option<OrderId>,
    pub created_at: TimeMs,
}
