//! First-fit unit selection.
//!
//! The caller (the booking service) gathers, per candidate unit, the stay
//! ranges of non-cancelled bookings overlapping the requested range. That
//! lookup runs inside the booking transaction, so the verdict here cannot
//! go stale before the insert commits. Candidate lists computed outside
//! the transaction are re-checked the same way.

use uuid::Uuid;

use crate::domain::StayRange;

/// One unit with its known conflicts for the requested range.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub room_id: Uuid,
    pub conflicts: Vec<StayRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationFailure {
    /// Every candidate in the list was taken.
    NoAvailability,
    /// The one explicitly requested unit was taken; carries the
    /// conflicting range for the caller's error message.
    Conflict { room_id: Uuid, range: StayRange },
}

/// Deterministic first-fit over the caller-supplied order: the first
/// candidate with zero conflicts wins. A single-element list is the
/// explicit-unit case and reports its conflict instead of a generic
/// no-availability.
pub fn select_unit(candidates: &[Candidate]) -> Result<Uuid, AllocationFailure> {
    for candidate in candidates {
        if candidate.conflicts.is_empty() {
            return Ok(candidate.room_id);
        }
    }

    if let [only] = candidates {
        if let Some(range) = only.conflicts.first() {
            return Err(AllocationFailure::Conflict {
                room_id: only.room_id,
                range: *range,
            });
        }
    }

    Err(AllocationFailure::NoAvailability)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(a: &str, b: &str) -> StayRange {
        StayRange::new(a.parse().unwrap(), b.parse().unwrap()).unwrap()
    }

    fn free(id: Uuid) -> Candidate {
        Candidate {
            room_id: id,
            conflicts: vec![],
        }
    }

    fn taken(id: Uuid) -> Candidate {
        Candidate {
            room_id: id,
            conflicts: vec![range("2024-06-10", "2024-06-12")],
        }
    }

    #[test]
    fn picks_first_free_in_caller_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let got = select_unit(&[taken(a), free(b), free(c)]).unwrap();
        assert_eq!(got, b);
    }

    #[test]
    fn exhausted_list_is_no_availability() {
        let err = select_unit(&[taken(Uuid::new_v4()), taken(Uuid::new_v4())]).unwrap_err();
        assert_eq!(err, AllocationFailure::NoAvailability);

        let err = select_unit(&[]).unwrap_err();
        assert_eq!(err, AllocationFailure::NoAvailability);
    }

    #[test]
    fn explicit_unit_names_the_conflicting_range() {
        let id = Uuid::new_v4();
        let err = select_unit(&[taken(id)]).unwrap_err();
        match err {
            AllocationFailure::Conflict { room_id, range: r } => {
                assert_eq!(room_id, id);
                assert_eq!(r, range("2024-06-10", "2024-06-12"));
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }
}
