use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{TransactionReason, WalletTransaction},
    error::Result,
};

#[derive(Deserialize)]
pub struct MutationRequest {
    pub amount: i64,
    pub reason: TransactionReason,
    pub booking_id: Option<Uuid>,
}

pub async fn balance(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let balance = match state.service_context.wallet_repo.find_by_user(user_id).await? {
        Some(account) => account.balance,
        None => 0,
    };
    Ok(Json(json!({ "user_id": user_id, "balance": balance })))
}

pub async fn transactions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<WalletTransaction>>> {
    let repo = &state.service_context.wallet_repo;
    let entries = match repo.find_by_user(user_id).await? {
        Some(account) => repo.list_transactions(account.id).await?,
        None => vec![],
    };
    Ok(Json(entries))
}

pub async fn credit(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<MutationRequest>,
) -> Result<Json<Value>> {
    let account = state
        .service_context
        .wallet_repo
        .credit(user_id, request.amount, request.reason, request.booking_id)
        .await?;
    Ok(Json(json!({ "user_id": user_id, "balance": account.balance })))
}

pub async fn debit(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<MutationRequest>,
) -> Result<Json<Value>> {
    let account = state
        .service_context
        .wallet_repo
        .debit(user_id, request.amount, request.reason, request.booking_id)
        .await?;
    Ok(Json(json!({ "user_id": user_id, "balance": account.balance })))
}
