use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{
    CatalogItem, CatalogSource, Decimal, Discount, DiscountId, ItemId, StallId, TimeMs,
};
use crate::engine;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub stall_id: String,
    pub name: String,
    pub price: Decimal,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemResponse {
    pub item_id: String,
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<CreateItemResponse>), AppError> {
    if !req.price.is_positive() {
        return Err(AppError::BadRequest("price must be positive".into()));
    }
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let stall_id = StallId::new(req.stall_id.clone());
    if state.repo.get_stall(&stall_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "stall not found: {}",
            req.stall_id
        )));
    }

    let item = CatalogItem {
        id: ItemId::fresh(),
        stall_id,
        name: name.to_string(),
        price: req.price.round2(),
        category: req.category,
        created_at: TimeMs::now(),
    };
    state.repo.insert_catalog_item(&item).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateItemResponse {
            item_id: item.id.to_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountRequest {
    pub name: String,
    pub percent: Decimal,
    pub starts_at_ms: Option<i64>,
    pub ends_at_ms: Option<i64>,
    pub item_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountResponse {
    pub discount_id: String,
}

pub async fn create_discount(
    State(state): State<AppState>,
    Json(req): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<CreateDiscountResponse>), AppError> {
    if req.percent.is_negative() || req.percent > Decimal::hundred() {
        return Err(AppError::BadRequest(
            "percent must be between 0 and 100".into(),
        ));
    }
    if let (Some(start), Some(end)) = (req.starts_at_ms, req.ends_at_ms) {
        if end < start {
            return Err(AppError::BadRequest(
                "endsAtMs must not precede startsAtMs".into(),
            ));
        }
    }
    if req.item_ids.is_empty() {
        return Err(AppError::BadRequest(
            "discount must apply to at least one item".into(),
        ));
    }

    let mut item_ids = Vec::with_capacity(req.item_ids.len());
    for raw in &req.item_ids {
        let item_id = ItemId::new(raw.clone());
        if state.repo.get_catalog_item(&item_id).await?.is_none() {
            return Err(AppError::NotFound(format!("item not found: {}", raw)));
        }
        item_ids.push(item_id);
    }

    let discount = Discount {
        id: DiscountId::fresh(),
        name: req.name.trim().to_string(),
        percent: req.percent,
        starts_at: req.starts_at_ms.map(TimeMs::new),
        ends_at: req.ends_at_ms.map(TimeMs::new),
        created_at: TimeMs::now(),
    };
    state.repo.insert_discount(&discount).await?;
    for item_id in &item_ids {
        state.repo.link_discount_item(&discount.id, item_id).await?;
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateDiscountResponse {
            discount_id: discount.id.to_string(),
        }),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDto {
    pub discount_id: String,
    pub name: String,
    pub percent: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub item_id: String,
    pub stall_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub list_price: String,
    /// Price after the currently applicable discount; orders placed now
    /// freeze this value into their lines.
    pub effective_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountDto>,
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, AppError> {
    let item_id = ItemId::new(id.clone());
    let item = state
        .repo
        .get_catalog_item(&item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item not found: {}", id)))?;

    let candidates = state.repo.discounts_for_item(&item_id).await?;
    let chosen = engine::resolve(&candidates, TimeMs::now());
    let effective_price = engine::unit_price(item.price, chosen);

    Ok(Json(ItemResponse {
        item_id: item.id.to_string(),
        stall_id: item.stall_id.to_string(),
        name: item.name,
        category: item.category,
        list_price: item.price.to_canonical_string(),
        effective_price: effective_price.to_canonical_string(),
        discount: chosen.map(|d| DiscountDto {
            discount_id: d.id.to_string(),
            name: d.name.clone(),
            percent: d.percent.to_canonical_string(),
        }),
    }))
}
