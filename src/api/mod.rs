pub mod accounts;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod wallet;

use crate::config::Config;
use crate::db::Repository;
use crate::domain::CatalogSource;
use crate::orchestration::{Checkout, Fulfillment, IdempotencyGuard, WalletLedger};
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub checkout: Arc<Checkout>,
    pub wallet: Arc<WalletLedger>,
    pub fulfillment: Arc<Fulfillment>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        let guard = IdempotencyGuard::new(repo.clone(), config.idempotency_stale_ms);
        let catalog: Arc<dyn CatalogSource> = repo.clone();
        let checkout = Arc::new(Checkout::new(repo.clone(), catalog, guard));
        let wallet = Arc::new(WalletLedger::new(repo.clone()));
        let fulfillment = Arc::new(Fulfillment::new(repo.clone()));
        Self {
            repo,
            config,
            checkout,
            wallet,
            fulfillment,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/accounts", post(accounts::register_account))
        .route("/v1/stalls", post(accounts::register_stall))
        .route("/v1/catalog/items", post(catalog::create_item))
        .route("/v1/catalog/items/:id", get(catalog::get_item))
        .route("/v1/catalog/discounts", post(catalog::create_discount))
        .route("/v1/orders", post(orders::create_order))
        .route("/v1/orders/:id", get(orders::get_order))
        .route("/v1/orders/:id/status", patch(orders::update_status))
        .route("/v1/wallet/topup", post(wallet::topup))
        .route("/v1/wallet/:account_id", get(wallet::get_balance))
        .route("/v1/wallet/:account_id/entries", get(wallet::get_entries))
        .layer(cors)
        .with_state(state)
}
