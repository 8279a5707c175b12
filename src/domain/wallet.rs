//! Wallet ledger types.

use crate::domain::{AccountId, Decimal, OrderId, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A person with a prepaid balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Denormalized running balance; always equals the sum of this account's
    /// ledger entries. Never negative after commit.
    pub balance: Decimal,
    pub created_at: TimeMs,
}

/// Kind of ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Administrative credit onto the balance.
    Topup,
    /// Payment for an order.
    Debit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Topup => "topup",
            EntryKind::Debit => "debit",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown entry kind string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown wallet entry kind: {0}")]
pub struct ParseEntryKindError(pub String);

impl FromStr for EntryKind {
    type Err = ParseEntryKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topup" => Ok(EntryKind::Topup),
            "debit" => Ok(EntryKind::Debit),
            other => Err(ParseEntryKindError(other.to_string())),
        }
    }
}

/// One signed, immutable movement against an account's balance.
///
/// Append-only: entries are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: String,
    pub account_id: AccountId,
    /// Signed amount: positive for credits, negative for debits.
    pub amount: Decimal,
    pub kind: EntryKind,
    /// Order paid for, when this entry is a checkout debit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: TimeMs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_roundtrip() {
        assert_eq!("topup".parse::<EntryKind>().unwrap(), EntryKind::Topup);
        assert_eq!("debit".parse::<EntryKind>().unwrap(), EntryKind::Debit);
        assert!("refund".parse::<EntryKind>().is_err());
    }
}
