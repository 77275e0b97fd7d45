use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{config::ConfigError, store::StoreError, validation::ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Expected application/json")]
    ExpectedJson,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Invalid form data")]
    InvalidForm,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Internal error")]
    Storage(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::ExpectedJson
            | AppError::InvalidJson
            | AppError::InvalidForm
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(ref e) => {
                error!("Storage failure: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),

    #[error("Server I/O failure: {0}")]
    Io(#[from] std::io::Error),
}
