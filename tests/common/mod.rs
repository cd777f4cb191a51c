#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use roomledger::{
    clock::FixedClock,
    config::Settings,
    domain::{CreateBookingRequest, PaymentMethod, WalletOptions},
    service::ServiceContext,
};

/// In-memory database with the real migrations and a clock pinned to
/// `now`. One connection keeps every test hitting the same database.
pub async fn setup(now: DateTime<Utc>) -> anyhow::Result<Arc<ServiceContext>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let settings = Settings::default();
    Ok(Arc::new(ServiceContext::new(
        pool,
        &settings,
        Arc::new(FixedClock(now)),
    )))
}

/// Like `setup`, but on a throwaway file database with two pool
/// connections, so transactions can genuinely interleave. The caller
/// cleans up with [`remove_db`].
pub async fn setup_concurrent(
    now: DateTime<Utc>,
) -> anyhow::Result<(Arc<ServiceContext>, std::path::PathBuf)> {
    let path = std::env::temp_dir().join(format!("roomledger-test-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let settings = Settings::default();
    let ctx = Arc::new(ServiceContext::new(
        pool,
        &settings,
        Arc::new(FixedClock(now)),
    ));
    Ok((ctx, path))
}

pub fn remove_db(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

pub fn at(s: &str) -> DateTime<Utc> {
    s.parse().expect("valid timestamp")
}

pub fn booking_request(
    user_id: Uuid,
    room_id: Uuid,
    check_in: &str,
    check_out: &str,
    payment_method: PaymentMethod,
    total_amount: i64,
) -> CreateBookingRequest {
    CreateBookingRequest {
        hotel_id: Uuid::new_v4(),
        room_id: Some(room_id),
        candidate_room_ids: vec![],
        user_id,
        guest_name: "Rahim Uddin".to_string(),
        guest_email: "rahim@example.com".to_string(),
        guest_phone: None,
        check_in: check_in.parse().unwrap(),
        check_out: check_out.parse().unwrap(),
        payment_method,
        total_amount,
        wallet: WalletOptions::default(),
    }
}

pub fn with_wallet(mut request: CreateBookingRequest, amount: i64) -> CreateBookingRequest {
    request.wallet = WalletOptions {
        use_wallet_balance: true,
        wallet_amount: Some(amount),
    };
    request
}
