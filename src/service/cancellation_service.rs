use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    clock::Clock,
    config::BookingConfig,
    domain::{Booking, BookingFeeStatus, BookingStatus, TransactionReason},
    error::{AppError, Result},
    policy::{self, CancellationQuote},
    repository::{booking_repository, wallet_repository, BookingRepository},
};

#[derive(Debug, Clone, Serialize)]
pub struct CancellationOutcome {
    pub booking_id: Uuid,
    pub refund_amount: i64,
    pub is_late: bool,
}

pub struct CancellationService {
    repo: Arc<dyn BookingRepository>,
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    booking_config: BookingConfig,
}

impl CancellationService {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        pool: SqlitePool,
        clock: Arc<dyn Clock>,
        booking_config: BookingConfig,
    ) -> Self {
        Self {
            repo,
            pool,
            clock,
            booking_config,
        }
    }

    /// Refund arithmetic shared by preview and commit. Refundable money
    /// only exists when the fee was actually paid.
    fn quote_for(&self, booking: &Booking) -> CancellationQuote {
        let charged = if booking.booking_fee_status == BookingFeeStatus::Paid {
            booking.amount_charged()
        } else {
            0
        };
        policy::assess(
            booking.stay.check_in,
            self.booking_config.checkin_hour,
            booking.total_amount,
            charged,
            self.clock.now(),
        )
    }

    fn ensure_cancellable(booking: &Booking) -> Result<()> {
        match booking.status {
            BookingStatus::Pending | BookingStatus::Confirmed => Ok(()),
            BookingStatus::Cancelled => Err(AppError::AlreadyCancelled),
            BookingStatus::CheckedIn | BookingStatus::CheckedOut => Err(AppError::InvalidState(
                format!("cannot cancel a booking in {:?}", booking.status),
            )),
        }
    }

    /// Non-mutating preview of what cancelling now would refund. Returns
    /// `None` when the booking does not exist or can no longer be
    /// cancelled.
    pub async fn preview(&self, id: Uuid, user_id: Uuid) -> Result<Option<CancellationQuote>> {
        let Some(booking) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        if booking.user_id != user_id {
            return Err(AppError::Unauthorized);
        }
        if Self::ensure_cancellable(&booking).is_err() {
            return Ok(None);
        }
        Ok(Some(self.quote_for(&booking)))
    }

    /// Cancel and refund. Status flip, wallet credit, ledger append and
    /// the phone backfill commit together or not at all.
    pub async fn cancel(
        &self,
        id: Uuid,
        user_id: Uuid,
        reason: Option<String>,
    ) -> Result<CancellationOutcome> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let booking = booking_repository::fetch_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.user_id != user_id {
            return Err(AppError::Unauthorized);
        }
        Self::ensure_cancellable(&booking)?;

        let quote = self.quote_for(&booking);

        let wallet = wallet_repository::get_or_create(&mut tx, booking.user_id, now).await?;

        if quote.refund_amount > 0 {
            wallet_repository::apply_credit(
                &mut tx,
                wallet.id,
                quote.refund_amount,
                TransactionReason::Refund,
                Some(booking.id),
                now,
            )
            .await?;
        }

        if let (Some(phone), None) = (&booking.guest_phone, &wallet.phone) {
            wallet_repository::backfill_phone(&mut tx, wallet.id, phone, now).await?;
        }

        booking_repository::mark_cancelled(
            &mut tx,
            booking.id,
            reason.as_deref(),
            quote.refund_amount,
            quote.refund_amount > 0,
            now,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            refund = quote.refund_amount,
            tier = ?quote.tier,
            "booking cancelled"
        );

        Ok(CancellationOutcome {
            booking_id: booking.id,
            refund_amount: quote.refund_amount,
            is_late: quote.is_late,
        })
    }
}
