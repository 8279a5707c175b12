use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::orchestration::{CheckoutError, FulfillmentError, WalletError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Payment required: {0}")]
    PaymentRequired(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Request in progress")]
    InProgress,
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(_) | CheckoutError::MixedStalls => {
                AppError::BadRequest(err.to_string())
            }
            CheckoutError::AccountNotFound(_) | CheckoutError::ItemNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            CheckoutError::InsufficientFunds { .. } => AppError::PaymentRequired(err.to_string()),
            CheckoutError::InProgress => AppError::InProgress,
            CheckoutError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<FulfillmentError> for AppError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::OrderNotFound(_) => AppError::NotFound(err.to_string()),
            FulfillmentError::IllegalTransition { .. } => AppError::BadRequest(err.to_string()),
            FulfillmentError::Conflict => AppError::Conflict(err.to_string()),
            FulfillmentError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::AccountNotFound(_) => AppError::NotFound(err.to_string()),
            WalletError::InsufficientFunds { .. } => AppError::PaymentRequired(err.to_string()),
            WalletError::NonPositiveAmount => AppError::BadRequest(err.to_string()),
            WalletError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Not a failure: the duplicate request is being handled elsewhere.
        if matches!(self, AppError::InProgress) {
            let body = Json(json!({"message": "request in progress"}));
            return (StatusCode::ACCEPTED, body).into_response();
        }

        let (status, error_message) = match self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PaymentRequired(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InProgress => unreachable!("handled above"),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
