//! Domain types for the canteen order and ledger core.
//!
//! This module provides:
//! - Decimal money handling via a rust_decimal wrapper
//! - Entity id newtypes and TimeMs
//! - Catalog read model (items, discounts) and the lookup seam
//! - Orders, order lines, and the fulfillment status table
//! - Wallet accounts and ledger entries

pub mod catalog;
pub mod decimal;
pub mod idempotency;
pub mod order;
pub mod primitives;
pub mod wallet;

pub use catalog::{CatalogItem, CatalogSource, Discount, Stall};
pub use decimal::Decimal;
pub use idempotency::IdempotencyRecord;
pub use order::{Order, OrderLine, OrderStatus, ParsePaymentError, ParseStatusError, PaymentMethod};
pub use primitives::{AccountId, DiscountId, ItemId, OrderId, StallId, TimeMs};
pub use wallet::{Account, EntryKind, WalletEntry};
