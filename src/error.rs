use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("No availability for the requested dates")]
    NoAvailability,

    #[error("Room unavailable: {0}")]
    RoomUnavailable(String),

    #[error("Insufficient wallet balance: {0}")]
    InsufficientFunds(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A temporary error occurred, please retry",
                )
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.as_str()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::NoAvailability => (
                StatusCode::CONFLICT,
                "No availability for the requested dates",
            ),
            AppError::RoomUnavailable(ref msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::InsufficientFunds(ref msg) => (StatusCode::PAYMENT_REQUIRED, msg.as_str()),
            AppError::InvalidState(ref msg) => (StatusCode::CONFLICT, msg.as_str()),
            AppError::AlreadyCancelled => (StatusCode::CONFLICT, "Booking is already cancelled"),
            AppError::PaymentRequired(ref msg) => (StatusCode::PAYMENT_REQUIRED, msg.as_str()),
            AppError::Validation(ref msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.as_str()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
