use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{AccountId, Decimal, EntryKind};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: String,
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let balance = state
        .wallet
        .balance(&AccountId::new(account_id.clone()))
        .await?;

    Ok(Json(BalanceResponse {
        account_id,
        balance: balance.to_canonical_string(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletEntryDto {
    pub id: String,
    pub amount: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletEntriesResponse {
    pub account_id: String,
    pub entry_count: i64,
    pub entries: Vec<WalletEntryDto>,
}

pub async fn get_entries(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<WalletEntriesResponse>, AppError> {
    let entries = state
        .wallet
        .entries(&AccountId::new(account_id.clone()))
        .await?;

    let entry_count = entries.len() as i64;
    let entries = entries
        .into_iter()
        .map(|e| WalletEntryDto {
            id: e.id,
            amount: e.amount.to_canonical_string(),
            kind: e.kind,
            order_id: e.order_id.map(|o| o.to_string()),
            note: e.note,
            created_at_ms: e.created_at.as_ms(),
        })
        .collect();

    Ok(Json(WalletEntriesResponse {
        account_id,
        entry_count,
        entries,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupRequest {
    pub account_id: String,
    pub amount: Decimal,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupResponse {
    pub account_id: String,
    pub new_balance: String,
}

pub async fn topup(
    State(state): State<AppState>,
    Json(req): Json<TopupRequest>,
) -> Result<Json<TopupResponse>, AppError> {
    let account_id = AccountId::new(req.account_id.clone());
    let new_balance = state
        .wallet
        .credit(&account_id, req.amount, req.note)
        .await?;

    Ok(Json(TopupResponse {
        account_id: req.account_id,
        new_balance: new_balance.to_canonical_string(),
    }))
}
