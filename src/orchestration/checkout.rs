//! Checkout: builds an order and its lines in one atomic unit of work.

use crate::db::Repository;
use crate::domain::{
    AccountId, CatalogSource, Decimal, ItemId, Order, OrderId, OrderLine, OrderStatus,
    PaymentMethod, TimeMs,
};
use crate::engine;
use crate::orchestration::idempotency::{Admission, IdempotencyGuard};
use crate::orchestration::wallet::{WalletError, WalletLedger};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// One requested line: an item and how many of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub item_id: ItemId,
    pub qty: i64,
}

/// A checkout request, already authenticated and parsed.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub account_id: AccountId,
    pub items: Vec<OrderItem>,
    pub payment: PaymentMethod,
    pub idempotency_token: Option<String>,
}

/// The created (or deduplicated prior) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub total: Decimal,
    /// True when an earlier request with the same token already produced
    /// this order; nothing was created or debited by the current request.
    pub deduplicated: bool,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invalid order: {0}")]
    Validation(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("items span more than one stall")]
    MixedStalls,
    #[error("insufficient balance for order total {total}")]
    InsufficientFunds { total: Decimal },
    #[error("an identical request is already being processed")]
    InProgress,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl From<WalletError> for CheckoutError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::AccountNotFound(id) => CheckoutError::AccountNotFound(id),
            WalletError::InsufficientFunds { required } => {
                CheckoutError::InsufficientFunds { total: required }
            }
            WalletError::NonPositiveAmount => {
                CheckoutError::Validation("order total must not be negative".to_string())
            }
            WalletError::Db(e) => CheckoutError::Db(e),
        }
    }
}

/// Order builder over the catalog, the wallet ledger, and the idempotency
/// guard. All writes for one request commit together or not at all.
#[derive(Clone)]
pub struct Checkout {
    repo: Arc<Repository>,
    catalog: Arc<dyn CatalogSource>,
    guard: IdempotencyGuard,
}

impl Checkout {
    pub fn new(
        repo: Arc<Repository>,
        catalog: Arc<dyn CatalogSource>,
        guard: IdempotencyGuard,
    ) -> Self {
        Self {
            repo,
            catalog,
            guard,
        }
    }

    /// Create an order, or return the prior result for a duplicate token.
    ///
    /// # Errors
    /// See [`CheckoutError`]; any failure after validation rolls back the
    /// whole unit of work, so partial orders cannot exist.
    pub async fn place(&self, req: PlaceOrder) -> Result<PlacedOrder, CheckoutError> {
        validate(&req)?;
        let now = TimeMs::now();

        if self.repo.get_account(&req.account_id).await?.is_none() {
            return Err(CheckoutError::AccountNotFound(req.account_id.to_string()));
        }

        let admitted_token = match &req.idempotency_token {
            None => None,
            Some(token) => match self.guard.admit(token, &req.account_id, now).await? {
                Admission::Admitted => Some(token.clone()),
                Admission::Resolved(order_id) => {
                    let prior = self
                        .repo
                        .get_order(&order_id)
                        .await?
                        .ok_or(sqlx::Error::RowNotFound)?;
                    info!(
                        order = order_id.as_str(),
                        token = token.as_str(),
                        "duplicate checkout resolved to prior order"
                    );
                    return Ok(PlacedOrder {
                        order_id: prior.id,
                        status: prior.status,
                        total: prior.total,
                        deduplicated: true,
                    });
                }
                Admission::InProgress => return Err(CheckoutError::InProgress),
            },
        };

        match self.place_admitted(&req, now).await {
            Ok(placed) => Ok(placed),
            Err(e) => {
                // A clean failure must not leave the token locked until the
                // staleness threshold.
                if let Some(token) = &admitted_token {
                    self.guard.release(token, &req.account_id).await;
                }
                Err(e)
            }
        }
    }

    /// The admitted path: price every line and commit order, lines, debit,
    /// and token link as one transaction.
    async fn place_admitted(
        &self,
        req: &PlaceOrder,
        now: TimeMs,
    ) -> Result<PlacedOrder, CheckoutError> {
        let order_id = OrderId::fresh();
        let mut stall_id = None;
        let mut lines = Vec::with_capacity(req.items.len());
        let mut total = Decimal::zero();

        for item in &req.items {
            let catalog_item = self
                .catalog
                .item(&item.item_id)
                .await?
                .ok_or_else(|| CheckoutError::ItemNotFound(item.item_id.to_string()))?;

            match &stall_id {
                None => stall_id = Some(catalog_item.stall_id.clone()),
                Some(stall) if *stall != catalog_item.stall_id => {
                    return Err(CheckoutError::MixedStalls);
                }
                Some(_) => {}
            }

            // Every line resolves against the same instant, so two lines for
            // the same item always agree on the discount.
            let candidates = self.catalog.discounts_for_item(&item.item_id).await?;
            let discount = engine::resolve(&candidates, now);
            let unit_price = engine::unit_price(catalog_item.price, discount);

            total = total + engine::line_total(item.qty, unit_price);
            lines.push(OrderLine {
                order_id: order_id.clone(),
                item_id: item.item_id.clone(),
                qty: item.qty,
                unit_price,
            });
        }

        let stall_id = stall_id.expect("validated: items is non-empty");
        let order = Order {
            id: order_id.clone(),
            account_id: req.account_id.clone(),
            stall_id,
            status: OrderStatus::AwaitingConfirmation,
            total,
            created_at: now,
        };

        let mut uow = self.repo.unit_of_work().await?;
        uow.insert_order(&order).await?;
        for line in &lines {
            uow.insert_order_line(line, now).await?;
        }

        if req.payment == PaymentMethod::Wallet {
            WalletLedger::debit_within(&mut uow, &req.account_id, total, &order_id, now).await?;
        }

        if let Some(token) = &req.idempotency_token {
            uow.link_idempotency_key(token, &req.account_id, &order_id)
                .await?;
        }

        uow.commit().await?;

        info!(
            order = order_id.as_str(),
            account = req.account_id.as_str(),
            stall = order.stall_id.as_str(),
            total = %total,
            payment = %req.payment,
            lines = lines.len(),
            "order created"
        );

        Ok(PlacedOrder {
            order_id,
            status: order.status,
            total,
            deduplicated: false,
        })
    }
}

fn validate(req: &PlaceOrder) -> Result<(), CheckoutError> {
    if req.items.is_empty() {
        return Err(CheckoutError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }
    for item in &req.items {
        if item.qty <= 0 {
            return Err(CheckoutError::Validation(format!(
                "quantity for item {} must be positive",
                item.item_id
            )));
        }
    }
    Ok(())
}
