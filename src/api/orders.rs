use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::AppState;
use crate::domain::{AccountId, ItemId, OrderId, OrderStatus, PaymentMethod, StallId};
use crate::error::AppError;
use crate::orchestration::{OrderItem, PlaceOrder, TransitionOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub item_id: String,
    pub qty: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub account_id: String,
    pub items: Vec<OrderItemDto>,
    pub payment_method: String,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub total: String,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), AppError> {
    let payment = PaymentMethod::from_str(&req.payment_method)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // Header takes precedence over the body field.
    let idempotency_token = non_empty(
        headers
            .get("Idempotency-Key")
            .and_then(|v| v.to_str().ok()),
    )
    .or_else(|| non_empty(req.idempotency_key.as_deref()));

    let placed = state
        .checkout
        .place(PlaceOrder {
            account_id: AccountId::new(req.account_id),
            items: req
                .items
                .into_iter()
                .map(|i| OrderItem {
                    item_id: ItemId::new(i.item_id),
                    qty: i.qty,
                })
                .collect(),
            payment,
            idempotency_token,
        })
        .await?;

    // A deduplicated submission reports the prior result, not a creation.
    let status_code = if placed.deduplicated {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status_code,
        Json(CreateOrderResponse {
            order_id: placed.order_id.to_string(),
            status: placed.status,
            total: placed.total.to_canonical_string(),
        }),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDto {
    pub item_id: String,
    pub qty: i64,
    pub unit_price: String,
    pub subtotal: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: String,
    pub account_id: String,
    pub stall_id: String,
    pub status: OrderStatus,
    pub created_at_ms: i64,
    pub items: Vec<OrderLineDto>,
    pub total: String,
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order_id = OrderId::new(id.clone());
    let order = state
        .repo
        .get_order(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order not found: {}", id)))?;

    let lines = state.repo.get_order_lines(&order_id).await?;
    let items = lines
        .iter()
        .map(|l| OrderLineDto {
            item_id: l.item_id.to_string(),
            qty: l.qty,
            unit_price: l.unit_price.to_canonical_string(),
            subtotal: l.subtotal().to_canonical_string(),
        })
        .collect();

    Ok(Json(OrderResponse {
        order_id: order.id.to_string(),
        account_id: order.account_id.to_string(),
        stall_id: order.stall_id.to_string(),
        status: order.status,
        created_at_ms: order.created_at.as_ms(),
        items,
        total: order.total.to_canonical_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub target_status: String,
    pub stall_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    pub order_id: String,
    pub new_status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let target = OrderStatus::from_str(&req.target_status)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let outcome = state
        .fulfillment
        .transition(
            &OrderId::new(id.clone()),
            target,
            &StallId::new(req.stall_id),
        )
        .await?;

    let message = match outcome {
        TransitionOutcome::AlreadyInTarget(_) => Some("already in target status".to_string()),
        TransitionOutcome::Updated(_) => None,
    };

    Ok(Json(UpdateStatusResponse {
        order_id: id,
        new_status: outcome.status(),
        message,
    }))
}
