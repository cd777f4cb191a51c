use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        Booking, BookingFeeStatus, BookingStatus, PaymentMethod, PaymentStatus, StayRange,
    },
    error::{AppError, Result},
    repository::BookingRepository,
};

// Database row struct that matches the SQLite schema
#[derive(FromRow)]
struct BookingRow {
    id: String,
    hotel_id: String,
    room_id: String,
    user_id: String,
    guest_name: String,
    guest_email: String,
    guest_phone: Option<String>,
    check_in: NaiveDate,
    check_out: NaiveDate,
    nights: i64,
    total_amount: i64,
    commission_amount: i64,
    net_amount: i64,
    booking_fee: i64,
    booking_fee_status: String,
    payment_method: String,
    payment_status: String,
    status: String,
    wallet_amount_used: i64,
    checkin_token: String,
    expires_at: Option<NaiveDateTime>,
    cancellation_reason: Option<String>,
    cancelled_at: Option<NaiveDateTime>,
    refund_amount: Option<i64>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const SELECT_BOOKING: &str = r#"
    SELECT id, hotel_id, room_id, user_id, guest_name, guest_email, guest_phone,
           check_in, check_out, nights, total_amount, commission_amount, net_amount,
           booking_fee, booking_fee_status, payment_method, payment_status, status,
           wallet_amount_used, checkin_token, expires_at, cancellation_reason,
           cancelled_at, refund_amount, created_at, updated_at
    FROM bookings
"#;

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

fn row_to_booking(row: BookingRow) -> Result<Booking> {
    Ok(Booking {
        id: parse_uuid(&row.id)?,
        hotel_id: parse_uuid(&row.hotel_id)?,
        room_id: parse_uuid(&row.room_id)?,
        user_id: parse_uuid(&row.user_id)?,
        guest_name: row.guest_name,
        guest_email: row.guest_email,
        guest_phone: row.guest_phone,
        stay: StayRange {
            check_in: row.check_in,
            check_out: row.check_out,
        },
        nights: row.nights,
        total_amount: row.total_amount,
        commission_amount: row.commission_amount,
        net_amount: row.net_amount,
        booking_fee: row.booking_fee,
        booking_fee_status: parse_fee_status(&row.booking_fee_status)?,
        payment_method: parse_payment_method(&row.payment_method)?,
        payment_status: parse_payment_status(&row.payment_status)?,
        status: parse_status(&row.status)?,
        wallet_amount_used: row.wallet_amount_used,
        checkin_token: row.checkin_token,
        expires_at: row
            .expires_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        cancellation_reason: row.cancellation_reason,
        cancelled_at: row
            .cancelled_at
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        refund_amount: row.refund_amount,
        created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
    })
}

fn parse_status(s: &str) -> Result<BookingStatus> {
    match s {
        "Pending" => Ok(BookingStatus::Pending),
        "Confirmed" => Ok(BookingStatus::Confirmed),
        "CheckedIn" => Ok(BookingStatus::CheckedIn),
        "CheckedOut" => Ok(BookingStatus::CheckedOut),
        "Cancelled" => Ok(BookingStatus::Cancelled),
        _ => Err(AppError::Database(format!("Invalid booking status: {}", s))),
    }
}

pub(crate) fn status_to_str(status: &BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "Pending",
        BookingStatus::Confirmed => "Confirmed",
        BookingStatus::CheckedIn => "CheckedIn",
        BookingStatus::CheckedOut => "CheckedOut",
        BookingStatus::Cancelled => "Cancelled",
    }
}

fn parse_fee_status(s: &str) -> Result<BookingFeeStatus> {
    match s {
        "Pending" => Ok(BookingFeeStatus::Pending),
        "Paid" => Ok(BookingFeeStatus::Paid),
        "Waived" => Ok(BookingFeeStatus::Waived),
        _ => Err(AppError::Database(format!("Invalid fee status: {}", s))),
    }
}

fn fee_status_to_str(status: &BookingFeeStatus) -> &'static str {
    match status {
        BookingFeeStatus::Pending => "Pending",
        BookingFeeStatus::Paid => "Paid",
        BookingFeeStatus::Waived => "Waived",
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
    match s {
        "WALLET" => Ok(PaymentMethod::Wallet),
        "PAY_AT_HOTEL" => Ok(PaymentMethod::PayAtHotel),
        "BKASH" => Ok(PaymentMethod::Bkash),
        "NAGAD" => Ok(PaymentMethod::Nagad),
        "CARD" => Ok(PaymentMethod::Card),
        _ => Err(AppError::Database(format!("Invalid payment method: {}", s))),
    }
}

fn payment_method_to_str(method: &PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Wallet => "WALLET",
        PaymentMethod::PayAtHotel => "PAY_AT_HOTEL",
        PaymentMethod::Bkash => "BKASH",
        PaymentMethod::Nagad => "NAGAD",
        PaymentMethod::Card => "CARD",
    }
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus> {
    match s {
        "Pending" => Ok(PaymentStatus::Pending),
        "Paid" => Ok(PaymentStatus::Paid),
        "Refunded" => Ok(PaymentStatus::Refunded),
        _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
    }
}

fn payment_status_to_str(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "Pending",
        PaymentStatus::Paid => "Paid",
        PaymentStatus::Refunded => "Refunded",
    }
}

// --- Connection-scoped helpers -------------------------------------------
//
// These run inside the caller's transaction so the availability check,
// the insert and the wallet writes commit (or roll back) together.

#[derive(FromRow)]
struct StayRow {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

/// Stay ranges of non-cancelled bookings on `room_id` overlapping `stay`.
pub async fn overlapping_stays(
    conn: &mut SqliteConnection,
    room_id: Uuid,
    stay: &StayRange,
) -> Result<Vec<StayRange>> {
    let rows = sqlx::query_as::<_, StayRow>(
        r#"
        SELECT check_in, check_out
        FROM bookings
        WHERE room_id = ?
          AND status != 'Cancelled'
          AND check_in < ?
          AND check_out > ?
        ORDER BY check_in
        "#,
    )
    .bind(room_id.to_string())
    .bind(stay.check_out)
    .bind(stay.check_in)
    .fetch_all(conn)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|r| StayRange {
            check_in: r.check_in,
            check_out: r.check_out,
        })
        .collect())
}

pub async fn insert(conn: &mut SqliteConnection, booking: &Booking) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, hotel_id, room_id, user_id, guest_name, guest_email, guest_phone,
            check_in, check_out, nights, total_amount, commission_amount, net_amount,
            booking_fee, booking_fee_status, payment_method, payment_status, status,
            wallet_amount_used, checkin_token, expires_at, cancellation_reason,
            cancelled_at, refund_amount, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(booking.id.to_string())
    .bind(booking.hotel_id.to_string())
    .bind(booking.room_id.to_string())
    .bind(booking.user_id.to_string())
    .bind(&booking.guest_name)
    .bind(&booking.guest_email)
    .bind(&booking.guest_phone)
    .bind(booking.stay.check_in)
    .bind(booking.stay.check_out)
    .bind(booking.nights)
    .bind(booking.total_amount)
    .bind(booking.commission_amount)
    .bind(booking.net_amount)
    .bind(booking.booking_fee)
    .bind(fee_status_to_str(&booking.booking_fee_status))
    .bind(payment_method_to_str(&booking.payment_method))
    .bind(payment_status_to_str(&booking.payment_status))
    .bind(status_to_str(&booking.status))
    .bind(booking.wallet_amount_used)
    .bind(&booking.checkin_token)
    .bind(booking.expires_at.map(|dt| dt.naive_utc()))
    .bind(&booking.cancellation_reason)
    .bind(booking.cancelled_at.map(|dt| dt.naive_utc()))
    .bind(booking.refund_amount)
    .bind(booking.created_at.naive_utc())
    .bind(booking.updated_at.naive_utc())
    .execute(conn)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

pub async fn fetch_by_id(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<Booking>> {
    let row = sqlx::query_as::<_, BookingRow>(&format!("{} WHERE id = ?", SELECT_BOOKING))
        .bind(id.to_string())
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    match row {
        Some(r) => Ok(Some(row_to_booking(r)?)),
        None => Ok(None),
    }
}

/// Soft-delete: flips the row to Cancelled and records the outcome.
pub async fn mark_cancelled(
    conn: &mut SqliteConnection,
    id: Uuid,
    reason: Option<&str>,
    refund_amount: i64,
    refunded: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let payment_status = if refunded {
        payment_status_to_str(&PaymentStatus::Refunded)
    } else {
        payment_status_to_str(&PaymentStatus::Pending)
    };

    sqlx::query(
        r#"
        UPDATE bookings
        SET status = 'Cancelled',
            cancellation_reason = ?,
            cancelled_at = ?,
            refund_amount = ?,
            payment_status = CASE WHEN ? THEN ? ELSE payment_status END,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(reason)
    .bind(now.naive_utc())
    .bind(refund_amount)
    .bind(refunded)
    .bind(payment_status)
    .bind(now.naive_utc())
    .bind(id.to_string())
    .execute(conn)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

// --- Pool-backed repository ----------------------------------------------

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE user_id = ? ORDER BY created_at DESC",
            SELECT_BOOKING
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn list_expired_holds(&self, now: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE status = 'Pending' AND expires_at IS NOT NULL AND expires_at < ? \
             ORDER BY expires_at",
            SELECT_BOOKING
        ))
        .bind(now.naive_utc())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        if !from.can_transition(to) {
            return Err(AppError::InvalidState(format!(
                "cannot move a booking from {:?} to {:?}",
                from, to
            )));
        }

        let result = sqlx::query(
            "UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
        )
        .bind(status_to_str(&to))
        .bind(now.naive_utc())
        .bind(id.to_string())
        .bind(status_to_str(&from))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        // Zero rows means the booking moved on since the caller read it,
        // typically a cancellation winning the race.
        if result.rows_affected() == 0 {
            return match self.find_by_id(id).await? {
                Some(current) => Err(AppError::InvalidState(format!(
                    "booking is {:?}, expected {:?}",
                    current.status, from
                ))),
                None => Err(AppError::NotFound("Booking not found".to_string())),
            };
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated booking".to_string()))
    }
}
