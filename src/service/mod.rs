pub mod booking_service;
pub mod cancellation_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::clock::Clock;
use crate::config::Settings;
use crate::repository::*;

pub use booking_service::BookingService;
pub use cancellation_service::{CancellationOutcome, CancellationService};

pub struct ServiceContext {
    pub booking_service: Arc<BookingService>,
    pub cancellation_service: Arc<CancellationService>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub wallet_repo: Arc<dyn WalletRepository>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        let booking_repo: Arc<dyn BookingRepository> =
            Arc::new(SqliteBookingRepository::new(db_pool.clone()));
        let wallet_repo: Arc<dyn WalletRepository> =
            Arc::new(SqliteWalletRepository::new(db_pool.clone()));

        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            db_pool.clone(),
            clock.clone(),
            settings.booking.clone(),
            settings.payments.clone(),
        ));
        let cancellation_service = Arc::new(CancellationService::new(
            booking_repo.clone(),
            db_pool.clone(),
            clock,
            settings.booking.clone(),
        ));

        Self {
            booking_service,
            cancellation_service,
            booking_repo,
            wallet_repo,
            db_pool,
        }
    }
}
