use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Account, AccountId, Decimal, Stall, StallId, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAccountRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAccountResponse {
    pub account_id: String,
    pub balance: String,
}

pub async fn register_account(
    State(state): State<AppState>,
    Json(req): Json<RegisterAccountRequest>,
) -> Result<(StatusCode, Json<RegisterAccountResponse>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let account = Account {
        id: AccountId::fresh(),
        name: name.to_string(),
        balance: Decimal::zero(),
        created_at: TimeMs::now(),
    };
    state.repo.insert_account(&account).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterAccountResponse {
            account_id: account.id.to_string(),
            balance: account.balance.to_canonical_string(),
        }),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStallRequest {
    pub owner_account_id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStallResponse {
    pub stall_id: String,
}

pub async fn register_stall(
    State(state): State<AppState>,
    Json(req): Json<RegisterStallRequest>,
) -> Result<(StatusCode, Json<RegisterStallResponse>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }

    let owner = AccountId::new(req.owner_account_id.clone());
    if state.repo.get_account(&owner).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "account not found: {}",
            req.owner_account_id
        )));
    }

    let stall = Stall {
        id: StallId::fresh(),
        owner_account_id: owner,
        name: name.to_string(),
        created_at: TimeMs::now(),
    };
    state.repo.insert_stall(&stall).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterStallResponse {
            stall_id: stall.id.to_string(),
        }),
    ))
}
