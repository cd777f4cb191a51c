use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod wallet_repository;

pub use booking_repository::SqliteBookingRepository;
pub use wallet_repository::SqliteWalletRepository;

/// Pool-backed reads and single-row writes. The multi-row atomic flows
/// (creation, cancellation) go through the connection-scoped helpers in
/// the repository modules instead, so one transaction can span booking,
/// wallet and ledger writes.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>>;
    /// Pending bookings whose payment hold has lapsed; consumed by the
    /// external reaper.
    async fn list_expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Booking>>;
    /// Compare-and-set status move: the write only lands while the row
    /// still holds `from`, so a transition validated against a stale
    /// read cannot overwrite a terminal state.
    async fn transition_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<Booking>;
}

#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<WalletAccount>>;
    async fn get_or_create(&self, user_id: Uuid) -> Result<WalletAccount>;
    async fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<WalletTransaction>>;
    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: TransactionReason,
        booking_id: Option<Uuid>,
    ) -> Result<WalletAccount>;
    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: TransactionReason,
        booking_id: Option<Uuid>,
    ) -> Result<WalletAccount>;
}
