pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use db::{init_db, Repository, UnitOfWork};
pub use domain::{
    Account, AccountId, CatalogItem, CatalogSource, Decimal, Discount, DiscountId, EntryKind,
    ItemId, Order, OrderId, OrderLine, OrderStatus, PaymentMethod, Stall, StallId, TimeMs,
    WalletEntry,
};
pub use error::AppError;
pub use orchestration::{
    Admission, Checkout, CheckoutError, Fulfillment, FulfillmentError, IdempotencyGuard,
    OrderItem, PlaceOrder, PlacedOrder, TransitionOutcome, WalletError, WalletLedger,
};
