use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Booking, BookingReceipt, CreateBookingRequest},
    error::Result,
    policy::CancellationQuote,
    service::CancellationOutcome,
};

/// Identity is an external collaborator; callers pass the acting user and
/// ownership is enforced against the booking row.
#[derive(Deserialize)]
pub struct OwnerQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub user_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct OwnerBody {
    pub user_id: Uuid,
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>)> {
    let receipt = state
        .service_context
        .booking_service
        .create_booking(request)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .get_booking(id, owner.user_id)
        .await?;
    Ok(Json(booking))
}

pub async fn list(
    State(state): State<AppState>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Vec<Booking>>> {
    let bookings = state
        .service_context
        .booking_service
        .list_for_user(owner.user_id)
        .await?;
    Ok(Json(bookings))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<CancellationOutcome>> {
    let outcome = state
        .service_context
        .cancellation_service
        .cancel(id, request.user_id, request.reason)
        .await?;
    Ok(Json(outcome))
}

/// Same arithmetic as `cancel`, no side effects. Serializes to `null`
/// when the booking is unknown or no longer cancellable.
pub async fn cancellation_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(owner): Query<OwnerQuery>,
) -> Result<Json<Option<CancellationQuote>>> {
    let quote = state
        .service_context
        .cancellation_service
        .preview(id, owner.user_id)
        .await?;
    Ok(Json(quote))
}

pub async fn check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<OwnerBody>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .check_in(id, body.user_id)
        .await?;
    Ok(Json(booking))
}

pub async fn check_out(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<OwnerBody>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .booking_service
        .check_out(id, body.user_id)
        .await?;
    Ok(Json(booking))
}

/// Feed for the externally scheduled reaper that releases lapsed holds.
pub async fn expired_holds(State(state): State<AppState>) -> Result<Json<Vec<Booking>>> {
    let holds = state
        .service_context
        .booking_service
        .expired_holds()
        .await?;
    Ok(Json(holds))
}
