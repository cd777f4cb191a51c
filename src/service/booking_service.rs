use std::sync::Arc;

use chrono::Duration;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    allocator::{self, AllocationFailure, Candidate},
    clock::Clock,
    config::{BookingConfig, PaymentsConfig},
    domain::*,
    error::{AppError, Result},
    payments,
    repository::{booking_repository, wallet_repository, BookingRepository},
};

pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    booking_config: BookingConfig,
    payments_config: PaymentsConfig,
}

impl BookingService {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        pool: SqlitePool,
        clock: Arc<dyn Clock>,
        booking_config: BookingConfig,
        payments_config: PaymentsConfig,
    ) -> Self {
        Self {
            repo,
            pool,
            clock,
            booking_config,
            payments_config,
        }
    }

    /// Create a booking: allocate a unit, settle what the wallet covers,
    /// persist booking plus ledger entry. Availability re-check, wallet
    /// debit and both inserts run in one transaction; two requests racing
    /// for the same unit and range cannot both commit.
    pub async fn create_booking(&self, request: CreateBookingRequest) -> Result<BookingReceipt> {
        request.validate()?;
        let stay = StayRange::new(request.check_in, request.check_out)?;

        // An explicit unit is just a one-element candidate list; the
        // allocator reports its conflict instead of a generic failure.
        let candidate_ids = match request.room_id {
            Some(id) => vec![id],
            None if !request.candidate_room_ids.is_empty() => request.candidate_room_ids.clone(),
            None => {
                return Err(AppError::Validation(
                    "either room_id or candidate_room_ids is required".to_string(),
                ))
            }
        };

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        // Candidate lists may have been computed from stale reads; the
        // conflict lookup happens here, inside the transaction.
        let mut candidates = Vec::with_capacity(candidate_ids.len());
        for room_id in candidate_ids {
            let conflicts = booking_repository::overlapping_stays(&mut tx, room_id, &stay).await?;
            candidates.push(Candidate { room_id, conflicts });
        }

        let room_id = allocator::select_unit(&candidates).map_err(|failure| match failure {
            AllocationFailure::NoAvailability => AppError::NoAvailability,
            AllocationFailure::Conflict { range, .. } => {
                AppError::RoomUnavailable(format!("room is already booked {}", range))
            }
        })?;

        let wallet = wallet_repository::get_or_create(&mut tx, request.user_id, now).await?;
        let plan = payments::plan(
            request.payment_method,
            request.total_amount,
            wallet.balance,
            &request.wallet,
            self.payments_config.wallet_shortfall,
        )?;

        let commission_amount = twenty_percent(request.total_amount);
        let status = if plan.fee_status == BookingFeeStatus::Paid {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        };
        let expires_at = (plan.fee_status == BookingFeeStatus::Pending)
            .then(|| now + Duration::minutes(self.booking_config.hold_minutes));

        let booking_id = Uuid::new_v4();
        let checkin_token = CheckinTokenPayload {
            booking_id,
            hotel_id: request.hotel_id,
            room_id,
        }
        .encode();

        let booking = Booking {
            id: booking_id,
            hotel_id: request.hotel_id,
            room_id,
            user_id: request.user_id,
            guest_name: request.guest_name.clone(),
            guest_email: request.guest_email.clone(),
            guest_phone: request.guest_phone.clone(),
            stay,
            nights: stay.nights(),
            total_amount: request.total_amount,
            commission_amount,
            net_amount: request.total_amount - commission_amount,
            booking_fee: plan.booking_fee,
            booking_fee_status: plan.fee_status,
            payment_method: request.payment_method,
            payment_status: if plan.fee_status == BookingFeeStatus::Paid {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            },
            status,
            wallet_amount_used: plan.wallet_deduction,
            checkin_token,
            expires_at,
            cancellation_reason: None,
            cancelled_at: None,
            refund_amount: None,
            created_at: now,
            updated_at: now,
        };

        booking_repository::insert(&mut tx, &booking).await?;

        if plan.wallet_deduction > 0 {
            wallet_repository::apply_debit(
                &mut tx,
                wallet.id,
                plan.wallet_deduction,
                TransactionReason::BookingFee,
                Some(booking.id),
                now,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            room_id = %booking.room_id,
            status = ?booking.status,
            wallet_deduction = plan.wallet_deduction,
            requires_payment = plan.requires_payment,
            "booking created"
        );

        Ok(BookingReceipt {
            booking_id: booking.id,
            room_id: booking.room_id,
            status: booking.status,
            booking_fee: plan.booking_fee,
            advance_amount: plan.advance_amount,
            requires_payment: plan.requires_payment,
            wallet_payment_success: plan.wallet_payment_success(),
            wallet_amount_used: plan.wallet_deduction,
            checkin_token: booking.checkin_token,
            expires_at: booking.expires_at,
        })
    }

    pub async fn get_booking(&self, id: Uuid, user_id: Uuid) -> Result<Booking> {
        let booking = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        if booking.user_id != user_id {
            return Err(AppError::Unauthorized);
        }
        Ok(booking)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        self.repo.list_for_user(user_id).await
    }

    /// Check-in is only valid on the check-in date, from Confirmed. A
    /// Pending booking means the fee was never settled.
    pub async fn check_in(&self, id: Uuid, user_id: Uuid) -> Result<Booking> {
        let booking = self.get_booking(id, user_id).await?;

        match booking.status {
            BookingStatus::Confirmed => {}
            BookingStatus::Pending => {
                return Err(AppError::PaymentRequired(
                    "booking fee is unpaid".to_string(),
                ))
            }
            other => {
                return Err(AppError::InvalidState(format!(
                    "cannot check in from {:?}",
                    other
                )))
            }
        }

        let now = self.clock.now();
        if now.date_naive() != booking.stay.check_in {
            return Err(AppError::InvalidState(format!(
                "check-in opens on {}",
                booking.stay.check_in
            )));
        }

        self.repo
            .transition_status(id, BookingStatus::Confirmed, BookingStatus::CheckedIn, now)
            .await
    }

    pub async fn check_out(&self, id: Uuid, user_id: Uuid) -> Result<Booking> {
        let booking = self.get_booking(id, user_id).await?;

        if booking.status != BookingStatus::CheckedIn {
            return Err(AppError::InvalidState(format!(
                "cannot check out from {:?}",
                booking.status
            )));
        }

        self.repo
            .transition_status(
                id,
                BookingStatus::CheckedIn,
                BookingStatus::CheckedOut,
                self.clock.now(),
            )
            .await
    }

    /// Unpaid holds past expiry, for the externally scheduled reaper.
    pub async fn expired_holds(&self) -> Result<Vec<Booking>> {
        self.repo.list_expired_holds(self.clock.now()).await
    }
}
