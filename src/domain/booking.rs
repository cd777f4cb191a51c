use base64::Engine;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};

/// Round-half-up 20% of an amount in minor units. Used for both the
/// platform commission and the pay-at-hotel advance.
pub fn twenty_percent(amount: i64) -> i64 {
    (amount * 20 + 50) / 100
}

/// Half-open stay range `[check_in, check_out)`. A booking ending on a
/// given date does not conflict with one starting that date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self> {
        if check_out <= check_in {
            return Err(AppError::Validation(
                "check-out must be after check-in".to_string(),
            ));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn overlaps(&self, other: &StayRange) -> bool {
        other.check_in < self.check_out && other.check_out > self.check_in
    }

    /// Whole nights in the range, never less than one.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(1)
    }
}

impl std::fmt::Display for StayRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.check_in, self.check_out)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }

    /// Forward-only transitions. Cancellation is allowed from any
    /// pre-check-in state; everything else moves strictly ahead.
    pub fn can_transition(&self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Confirmed, CheckedIn)
                | (CheckedIn, CheckedOut)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingFeeStatus {
    Pending,
    Paid,
    Waived,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Wallet,
    PayAtHotel,
    Bkash,
    Nagad,
    Card,
}

impl PaymentMethod {
    /// Online methods owe the full stay amount up front; pay-at-hotel
    /// owes only the 20% advance.
    pub fn is_online(&self) -> bool {
        !matches!(self, PaymentMethod::PayAtHotel)
    }

    pub fn booking_fee(&self, total_amount: i64) -> i64 {
        if self.is_online() {
            total_amount
        } else {
            twenty_percent(total_amount)
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub hotel_id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub stay: StayRange,
    pub nights: i64,
    pub total_amount: i64,
    pub commission_amount: i64,
    pub net_amount: i64,
    pub booking_fee: i64,
    pub booking_fee_status: BookingFeeStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub wallet_amount_used: i64,
    pub checkin_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refund_amount: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// The amount actually collected at creation time: the wallet debit
    /// when one happened, otherwise the booking fee.
    pub fn amount_charged(&self) -> i64 {
        if self.wallet_amount_used > 0 {
            self.wallet_amount_used
        } else {
            self.booking_fee
        }
    }
}

/// Payload behind the scannable check-in token. The token is a hint for
/// the scanner, not proof of ownership; check-in re-verifies the caller
/// against the booking row.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckinTokenPayload {
    pub booking_id: Uuid,
    pub hotel_id: Uuid,
    pub room_id: Uuid,
}

impl CheckinTokenPayload {
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WalletOptions {
    #[serde(default)]
    pub use_wallet_balance: bool,
    #[serde(default)]
    pub wallet_amount: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub hotel_id: Uuid,
    /// Explicit unit, takes precedence over `candidate_room_ids`.
    pub room_id: Option<Uuid>,
    /// Interchangeable units in the caller's preference order. The list
    /// may be stale; availability is re-checked before the insert.
    #[serde(default)]
    pub candidate_room_ids: Vec<Uuid>,
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub guest_name: String,
    #[validate(email)]
    pub guest_email: String,
    #[validate(length(min = 6, max = 20))]
    pub guest_phone: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub payment_method: PaymentMethod,
    #[validate(range(min = 1))]
    pub total_amount: i64,
    #[serde(flatten)]
    pub wallet: WalletOptions,
}

/// Outcome handed back to the API layer after a successful creation.
#[derive(Debug, Clone, Serialize)]
pub struct BookingReceipt {
    pub booking_id: Uuid,
    pub room_id: Uuid,
    pub status: BookingStatus,
    pub booking_fee: i64,
    pub advance_amount: i64,
    pub requires_payment: bool,
    pub wallet_payment_success: bool,
    pub wallet_amount_used: i64,
    pub checkin_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}
