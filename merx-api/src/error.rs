use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use merx_core::OrderError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Order(OrderError),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Order(OrderError::NotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Order not found: {}", id))
            }
            AppError::Order(err @ OrderError::UnknownProducts { .. }) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            AppError::Order(err @ OrderError::Dependency { .. }) => {
                tracing::error!("Dependency failure: {:?}", err);
                (StatusCode::BAD_GATEWAY, "Upstream dependency failed".to_string())
            }
            AppError::Order(err @ OrderError::Storage { .. }) => {
                tracing::error!("Storage failure: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        Self::Order(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
