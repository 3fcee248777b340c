use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::inventory::StorageError;
use crate::services::provisioning::{ProvisioningError, ProvisioningStep};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Provisioning error: {0}")]
    Provisioning(#[from] ProvisioningError),
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<ProvisioningStep>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut step = None;
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Storage(StorageError::Duplicate(name)) => (
                StatusCode::CONFLICT,
                format!("Virtual machine '{}' already exists", name),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Provisioning(e) => {
                tracing::error!("Provisioning error: {}", e);
                step = Some(e.step);
                let status = if e.name_taken {
                    StatusCode::CONFLICT
                } else if e.step.is_provider_step() {
                    StatusCode::BAD_GATEWAY
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, e.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                detail: message,
                step,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
