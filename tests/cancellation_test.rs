mod common;

use std::sync::Arc;

use uuid::Uuid;

use roomledger::{
    domain::{BookingStatus, PaymentMethod, PaymentStatus, TransactionReason},
    error::AppError,
    service::ServiceContext,
};

use common::{at, booking_request, setup, with_wallet};

/// Wallet-funded pay-at-hotel booking for 2024-06-15..17, total 5000.
/// `charged` lands in the wallet first and is debited in full at
/// creation, so `amount_charged == charged`.
async fn paid_booking(
    ctx: &Arc<ServiceContext>,
    user: Uuid,
    charged: i64,
) -> anyhow::Result<Uuid> {
    ctx.wallet_repo
        .credit(user, charged, TransactionReason::TopUp, None)
        .await?;
    let request = with_wallet(
        booking_request(
            user,
            Uuid::new_v4(),
            "2024-06-15",
            "2024-06-17",
            PaymentMethod::PayAtHotel,
            5000,
        ),
        charged,
    );
    let receipt = ctx.booking_service.create_booking(request).await?;
    assert_eq!(receipt.wallet_amount_used, charged);
    assert_eq!(receipt.status, BookingStatus::Confirmed);
    Ok(receipt.booking_id)
}

// Tiers count down to 14:00 on the check-in date: 2024-06-15T14:00Z.

#[tokio::test]
async fn cancelling_a_day_ahead_refunds_the_full_charge() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-14T08:00:00Z")).await?; // 30h out
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1000).await?;

    let outcome = ctx
        .cancellation_service
        .cancel(booking_id, user, Some("change of plans".to_string()))
        .await?;
    assert_eq!(outcome.refund_amount, 1000);
    assert!(!outcome.is_late);

    let wallet = ctx.wallet_repo.find_by_user(user).await?.unwrap();
    assert_eq!(wallet.balance, 1000);

    let entries = ctx.wallet_repo.list_transactions(wallet.id).await?;
    let refund = entries.last().unwrap();
    assert_eq!(refund.reason, TransactionReason::Refund);
    assert_eq!(refund.amount, 1000);
    assert_eq!(refund.booking_id, Some(booking_id));

    let booking = ctx.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.refund_amount, Some(1000));
    assert_eq!(booking.payment_status, PaymentStatus::Refunded);
    assert_eq!(booking.cancellation_reason.as_deref(), Some("change of plans"));

    Ok(())
}

#[tokio::test]
async fn cancelling_inside_a_day_forfeits_the_advance() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-15T04:00:00Z")).await?; // 10h out
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1000).await?;

    let outcome = ctx.cancellation_service.cancel(booking_id, user, None).await?;
    assert_eq!(outcome.refund_amount, 0);
    assert!(outcome.is_late);

    // Nothing came back.
    let wallet = ctx.wallet_repo.find_by_user(user).await?.unwrap();
    assert_eq!(wallet.balance, 0);
    assert_eq!(ctx.wallet_repo.list_transactions(wallet.id).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn charge_above_the_advance_refunds_the_difference() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-15T04:00:00Z")).await?; // 10h out
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1500).await?;

    let outcome = ctx.cancellation_service.cancel(booking_id, user, None).await?;
    assert_eq!(outcome.refund_amount, 500);

    let wallet = ctx.wallet_repo.find_by_user(user).await?.unwrap();
    assert_eq!(wallet.balance, 500);

    Ok(())
}

#[tokio::test]
async fn no_refund_inside_two_hours() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-15T13:00:00Z")).await?; // 1h out
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1000).await?;

    let outcome = ctx.cancellation_service.cancel(booking_id, user, None).await?;
    assert_eq!(outcome.refund_amount, 0);
    assert!(outcome.is_late);

    Ok(())
}

#[tokio::test]
async fn preview_matches_commit_and_never_mutates() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-14T08:00:00Z")).await?;
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1500).await?;

    let first = ctx
        .cancellation_service
        .preview(booking_id, user)
        .await?
        .unwrap();
    let second = ctx
        .cancellation_service
        .preview(booking_id, user)
        .await?
        .unwrap();
    assert_eq!(first.refund_amount, second.refund_amount);
    assert_eq!(first.hours_remaining, 30);
    assert!(!first.is_late);
    assert!(!first.is_very_late);

    // Previewing changed nothing.
    let booking = ctx.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    let wallet = ctx.wallet_repo.find_by_user(user).await?.unwrap();
    assert_eq!(wallet.balance, 0);

    // The committing path pays out exactly the quoted amount.
    let outcome = ctx.cancellation_service.cancel(booking_id, user, None).await?;
    assert_eq!(outcome.refund_amount, first.refund_amount);

    Ok(())
}

#[tokio::test]
async fn unpaid_bookings_cancel_without_a_refund() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-14T08:00:00Z")).await?;
    let user = Uuid::new_v4();

    let receipt = ctx
        .booking_service
        .create_booking(booking_request(
            user,
            Uuid::new_v4(),
            "2024-06-15",
            "2024-06-17",
            PaymentMethod::Card,
            5000,
        ))
        .await?;

    let outcome = ctx
        .cancellation_service
        .cancel(receipt.booking_id, user, None)
        .await?;
    assert_eq!(outcome.refund_amount, 0);

    let wallet = ctx.wallet_repo.find_by_user(user).await?.unwrap();
    assert_eq!(wallet.balance, 0);
    assert!(ctx.wallet_repo.list_transactions(wallet.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn terminal_bookings_cannot_be_cancelled_again() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-14T08:00:00Z")).await?;
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1000).await?;

    ctx.cancellation_service.cancel(booking_id, user, None).await?;
    let balance_after = ctx.wallet_repo.find_by_user(user).await?.unwrap().balance;

    let err = ctx
        .cancellation_service
        .cancel(booking_id, user, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyCancelled));

    // No double refund.
    let wallet = ctx.wallet_repo.find_by_user(user).await?.unwrap();
    assert_eq!(wallet.balance, balance_after);

    // And a cancelled booking previews as null.
    assert!(ctx
        .cancellation_service
        .preview(booking_id, user)
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn checked_out_bookings_cannot_be_cancelled() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-15T04:00:00Z")).await?; // check-in day
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1000).await?;

    ctx.booking_service.check_in(booking_id, user).await?;
    ctx.booking_service.check_out(booking_id, user).await?;

    let err = ctx
        .cancellation_service
        .cancel(booking_id, user, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    Ok(())
}

#[tokio::test]
async fn stale_status_write_cannot_resurrect_a_cancelled_booking() -> anyhow::Result<()> {
    let now = at("2024-06-15T04:00:00Z"); // check-in day, so check-in is otherwise legal
    let ctx = setup(now).await?;
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1000).await?;

    // Cancellation wins the race: refund paid out, row terminal.
    ctx.cancellation_service.cancel(booking_id, user, None).await?;

    // A check-in that validated against a read taken before the cancel
    // commits exactly this write; the status guard must reject it.
    let err = ctx
        .booking_repo
        .transition_status(
            booking_id,
            BookingStatus::Confirmed,
            BookingStatus::CheckedIn,
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    let booking = ctx.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    // Illegal moves are refused outright, matched row or not.
    let err = ctx
        .booking_repo
        .transition_status(
            booking_id,
            BookingStatus::Cancelled,
            BookingStatus::CheckedIn,
            now,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));

    Ok(())
}

#[tokio::test]
async fn cancellation_is_owner_only() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-14T08:00:00Z")).await?;
    let user = Uuid::new_v4();
    let booking_id = paid_booking(&ctx, user, 1000).await?;

    let stranger = Uuid::new_v4();
    let err = ctx
        .cancellation_service
        .cancel(booking_id, stranger, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    let err = ctx
        .cancellation_service
        .preview(booking_id, stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    // Unknown bookings preview as null rather than erroring.
    assert!(ctx
        .cancellation_service
        .preview(Uuid::new_v4(), user)
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn cancellation_backfills_the_guest_phone() -> anyhow::Result<()> {
    let ctx = setup(at("2024-06-14T08:00:00Z")).await?;
    let user = Uuid::new_v4();
    ctx.wallet_repo
        .credit(user, 1000, TransactionReason::TopUp, None)
        .await?;

    let mut request = booking_request(
        user,
        Uuid::new_v4(),
        "2024-06-15",
        "2024-06-17",
        PaymentMethod::PayAtHotel,
        5000,
    );
    request.guest_phone = Some("01712345678".to_string());
    let receipt = ctx.booking_service.create_booking(request).await?;

    assert!(ctx
        .wallet_repo
        .find_by_user(user)
        .await?
        .unwrap()
        .phone
        .is_none());

    ctx.cancellation_service
        .cancel(receipt.booking_id, user, None)
        .await?;

    let wallet = ctx.wallet_repo.find_by_user(user).await?.unwrap();
    assert_eq!(wallet.phone.as_deref(), Some("01712345678"));

    Ok(())
}
