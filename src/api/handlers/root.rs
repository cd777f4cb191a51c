use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Roomledger API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Room inventory allocation, wallet payments and cancellation refunds",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "bookings": "/api/bookings",
            "wallet": "/api/wallet"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
