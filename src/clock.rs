use chrono::{DateTime, Utc};

/// Source of wall-clock time for the booking and cancellation rules.
///
/// The 24h/2h cancellation tiers and the same-day check-in rule are all
/// relative to "now", so services take a clock instead of calling
/// `Utc::now()` directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant. Used by tests to sit exactly on
/// either side of a tier boundary.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
