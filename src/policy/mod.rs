//! Time-banded cancellation policy.
//!
//! Hours remaining are measured to the check-in hour (14:00 by default)
//! on the check-in date. Three tiers: a day or more out the full charge
//! comes back, inside a day the 20% advance is forfeited, inside two
//! hours everything is. Both the preview endpoint and the committing
//! cancellation path call [`assess`]; there is no second copy of this
//! arithmetic anywhere.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::domain::twenty_percent;

pub const DEFAULT_CHECKIN_HOUR: u32 = 14;

const FULL_REFUND_MINUTES: i64 = 24 * 60;
const CUTOFF_MINUTES: i64 = 2 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundTier {
    Full,
    PartialForfeit,
    NoRefund,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancellationQuote {
    pub tier: RefundTier,
    pub hours_remaining: i64,
    pub is_late: bool,
    pub is_very_late: bool,
    pub amount_charged: i64,
    pub forfeit_amount: i64,
    pub refund_amount: i64,
    pub penalty_description: String,
}

/// Compute the refund for cancelling now. `amount_charged` is zero when
/// no money was collected (fee still pending or waived); the quote then
/// refunds nothing regardless of tier.
pub fn assess(
    check_in: NaiveDate,
    checkin_hour: u32,
    total_amount: i64,
    amount_charged: i64,
    now: DateTime<Utc>,
) -> CancellationQuote {
    let checkin_at = check_in
        .and_hms_opt(checkin_hour, 0, 0)
        .unwrap_or_else(|| check_in.and_time(NaiveTime::MIN))
        .and_utc();

    let remaining: Duration = checkin_at - now;
    let minutes = remaining.num_minutes();
    let hours_remaining = minutes / 60;

    let tier = if minutes >= FULL_REFUND_MINUTES {
        RefundTier::Full
    } else if minutes >= CUTOFF_MINUTES {
        RefundTier::PartialForfeit
    } else {
        RefundTier::NoRefund
    };

    let advance = twenty_percent(total_amount);
    let (forfeit_amount, refund_amount, penalty_description) = match tier {
        RefundTier::Full => (
            0,
            amount_charged,
            "free cancellation, full refund".to_string(),
        ),
        RefundTier::PartialForfeit => {
            let forfeit = advance.min(amount_charged);
            (
                forfeit,
                (amount_charged - advance).max(0),
                format!("late cancellation, {} advance forfeited", forfeit),
            )
        }
        RefundTier::NoRefund => (
            amount_charged,
            0,
            "cancellation inside 2 hours of check-in, no refund".to_string(),
        ),
    };

    CancellationQuote {
        tier,
        hours_remaining,
        is_late: minutes < FULL_REFUND_MINUTES,
        is_very_late: minutes < CUTOFF_MINUTES,
        amount_charged,
        forfeit_amount,
        refund_amount,
        penalty_description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_in() -> NaiveDate {
        "2024-06-15".parse().unwrap()
    }

    /// `now` positioned `hours` before 14:00 on the check-in date.
    fn hours_before(hours: i64) -> DateTime<Utc> {
        check_in().and_hms_opt(14, 0, 0).unwrap().and_utc() - Duration::hours(hours)
    }

    #[test]
    fn full_refund_a_day_or_more_out() {
        let q = assess(check_in(), 14, 5000, 1000, hours_before(30));
        assert_eq!(q.tier, RefundTier::Full);
        assert_eq!(q.refund_amount, 1000);
        assert_eq!(q.forfeit_amount, 0);
        assert!(!q.is_late);
    }

    #[test]
    fn advance_forfeited_inside_a_day() {
        let q = assess(check_in(), 14, 5000, 1000, hours_before(10));
        assert_eq!(q.tier, RefundTier::PartialForfeit);
        assert_eq!(q.forfeit_amount, 1000);
        assert_eq!(q.refund_amount, 0);
        assert!(q.is_late);
        assert!(!q.is_very_late);
    }

    #[test]
    fn charge_above_the_advance_refunds_the_difference() {
        let q = assess(check_in(), 14, 5000, 1500, hours_before(10));
        assert_eq!(q.forfeit_amount, 1000);
        assert_eq!(q.refund_amount, 500);
    }

    #[test]
    fn nothing_back_inside_two_hours() {
        let q = assess(check_in(), 14, 5000, 1000, hours_before(1));
        assert_eq!(q.tier, RefundTier::NoRefund);
        assert_eq!(q.refund_amount, 0);
        assert_eq!(q.forfeit_amount, 1000);
        assert!(q.is_very_late);
    }

    #[test]
    fn tier_boundaries_are_inclusive_on_the_generous_side() {
        assert_eq!(
            assess(check_in(), 14, 5000, 1000, hours_before(24)).tier,
            RefundTier::Full
        );
        assert_eq!(
            assess(check_in(), 14, 5000, 1000, hours_before(2)).tier,
            RefundTier::PartialForfeit
        );
    }

    #[test]
    fn after_checkin_time_counts_as_very_late() {
        let q = assess(check_in(), 14, 5000, 1000, hours_before(-3));
        assert_eq!(q.tier, RefundTier::NoRefund);
        assert!(q.hours_remaining <= 0);
    }

    #[test]
    fn zero_charge_refunds_nothing_in_any_tier() {
        for h in [30, 10, 1] {
            let q = assess(check_in(), 14, 5000, 0, hours_before(h));
            assert_eq!(q.refund_amount, 0);
        }
    }
}
