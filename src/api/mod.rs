pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        .nest("/api", api_routes())
        .with_state(app_state)
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", booking_routes())
        .nest("/wallet", wallet_routes())
}

fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::bookings::create))
        .route("/", get(handlers::bookings::list))
        .route("/expired-holds", get(handlers::bookings::expired_holds))
        .route("/:id", get(handlers::bookings::get))
        .route("/:id/cancel", post(handlers::bookings::cancel))
        .route(
            "/:id/cancellation-preview",
            get(handlers::bookings::cancellation_preview),
        )
        .route("/:id/check-in", post(handlers::bookings::check_in))
        .route("/:id/check-out", post(handlers::bookings::check_out))
}

fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(handlers::wallet::balance))
        .route("/:user_id/transactions", get(handlers::wallet::transactions))
        .route("/:user_id/credit", post(handlers::wallet::credit))
        .route("/:user_id/debit", post(handlers::wallet::debit))
}
