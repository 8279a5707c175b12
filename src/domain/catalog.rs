//! Catalog read model: items and discounts.
//!
//! Catalog records are owned by the menu administration side; this crate only
//! reads them. [`CatalogSource`] is the lookup seam consumed by checkout.

use crate::domain::{AccountId, Decimal, DiscountId, ItemId, StallId, TimeMs};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A seller unit, owned by one admin account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stall {
    pub id: StallId,
    pub owner_account_id: AccountId,
    pub name: String,
    pub created_at: TimeMs,
}

/// A priced product offered by exactly one stall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub stall_id: StallId,
    pub name: String,
    /// List price before any discount. Always > 0.
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: TimeMs,
}

/// A percentage price reduction with an optional active window.
///
/// A `None` start means "always started"; a `None` end means "never ends".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    /// Percent reduction in [0, 100].
    pub percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<TimeMs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<TimeMs>,
    pub created_at: TimeMs,
}

impl Discount {
    /// True if the discount window contains `as_of` (boundaries inclusive).
    pub fn is_active_at(&self, as_of: TimeMs) -> bool {
        if let Some(start) = self.starts_at {
            if as_of < start {
                return false;
            }
        }
        if let Some(end) = self.ends_at {
            if as_of > end {
                return false;
            }
        }
        true
    }
}

/// Read-only catalog lookup consumed by the checkout flow.
///
/// Implemented by the repository; kept as a trait so callers depend on the
/// lookup contract rather than on the storage layer.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one item by id.
    async fn item(&self, id: &ItemId) -> Result<Option<CatalogItem>, sqlx::Error>;

    /// Fetch every discount associated with an item, active or not.
    async fn discounts_for_item(&self, id: &ItemId) -> Result<Vec<Discount>, sqlx::Error>;
}
