use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::entity::orders::OrderStatus;
use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Order status cannot change from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Aggregate write failed")]
    AggregateWrite(#[source] sea_orm::DbErr),

    #[error("Database error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable identity of the failure: kind + numeric code.
    pub fn kind_and_code(&self) -> (&'static str, i32) {
        match self {
            AppError::NotFound => ("not_found", -1001),
            AppError::Validation(_) => ("validation", -3001),
            AppError::BadRequest(_) => ("bad_request", -3002),
            AppError::Forbidden => ("forbidden", -2001),
            AppError::Conflict(_) => ("conflict", -7001),
            AppError::EmptyCart => ("empty_cart", -7003),
            AppError::InvalidTransition { .. } => ("invalid_transition", -9001),
            AppError::AggregateWrite(_) => ("aggregate_write", -5002),
            AppError::OrmError(_) => ("database", -5000),
            AppError::Internal(_) => ("internal", -5999),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::EmptyCart => {
                StatusCode::BAD_REQUEST
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) | AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::AggregateWrite(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    kind: &'static str,
    code: i32,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (kind, code) = self.kind_and_code();

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                kind,
                code,
                error: self.to_string(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
