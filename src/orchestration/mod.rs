//! Transactional services coordinating the repository and the pure engine.
//!
//! Each service owns one concern: `checkout` materializes orders, `wallet`
//! is the only writer of balances, `fulfillment` drives order status, and
//! `idempotency` deduplicates retried submissions.

pub mod checkout;
pub mod fulfillment;
pub mod idempotency;
pub mod wallet;

pub use checkout::{Checkout, CheckoutError, OrderItem, PlaceOrder, PlacedOrder};
pub use fulfillment::{Fulfillment, FulfillmentError, TransitionOutcome};
pub use idempotency::{Admission, IdempotencyGuard};
pub use wallet::{WalletError, WalletLedger};
