//! Conflicts with a prisoner's own commitments and with non-associated
//! prisoners' commitments.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::booking::{BookingRecord, BookingState, NonAssociation, VisitStatus};
use crate::expander::SessionOccurrence;
use crate::template::DateRange;

/// Why an occurrence collides with existing commitments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    DoubleBookingOrReservation,
    NonAssociation,
}

/// Whether the prisoner already holds this exact slot.
///
/// `records` must be the requesting prisoner's own records. A booked visit
/// always conflicts; an in-progress application conflicts only when it was
/// created by someone other than `username` — the requester's own application
/// is the booking attempt being continued, not a clash with it.
pub fn own_slot_conflict(
    occurrence: &SessionOccurrence,
    records: &[BookingRecord],
    username: Option<&str>,
) -> bool {
    records.iter().any(|record| {
        if !record.matches_slot(
            &occurrence.prison_code,
            occurrence.date,
            occurrence.start_time,
            occurrence.end_time,
        ) {
            return false;
        }
        match &record.state {
            BookingState::Visit { status } => *status == VisitStatus::Booked,
            BookingState::Application {
                completed,
                created_by,
                ..
            } => !completed && username != Some(created_by.as_str()),
        }
    })
}

/// Whole days blocked by non-associated prisoners' commitments at the prison.
///
/// Day granularity is deliberate: one commitment anywhere in the day blocks
/// every slot that day. A link only blocks dates inside its effective window.
pub fn non_association_days(
    prisoner_id: &str,
    links: &[NonAssociation],
    counterpart_records: &BTreeMap<String, Vec<BookingRecord>>,
    prison_code: &str,
    window: &DateRange,
) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    for link in links {
        let Some(other) = link.counterpart_of(prisoner_id) else {
            continue;
        };
        let Some(records) = counterpart_records.get(other) else {
            continue;
        };
        for record in records {
            if record.prison_code == prison_code
                && window.contains(record.date)
                && record.live_commitment()
                && link.effective_on(record.date)
            {
                days.insert(record.date);
            }
        }
    }
    days
}
