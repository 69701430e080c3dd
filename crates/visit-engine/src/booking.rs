//! Read-only booking records and prisoner data.
//!
//! Visits and in-progress applications are created by the booking flow, which
//! lives outside this engine. Here they are only counted (capacity) and
//! checked against (conflicts); cancelled and changing records are invisible
//! to both.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Capacity channel a visit consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Restriction {
    Open,
    Closed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Reserved,
    Changing,
    Booked,
    Cancelled,
}

/// Whether a record is a visit or an application, with the lifecycle fields
/// that matter to counting and conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingState {
    Visit {
        status: VisitStatus,
    },
    Application {
        /// Applications only hold a seat once their slot is reserved;
        /// speculative ones do not count against capacity.
        reserved_slot: bool,
        /// A completed application's seat is counted through the resulting
        /// visit, never through the application itself.
        completed: bool,
        created_by: String,
    },
}

/// A booked visit or an in-progress application, as supplied by the booking
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub prisoner_id: String,
    pub prison_code: String,
    pub template_ref: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub restriction: Restriction,
    #[serde(flatten)]
    pub state: BookingState,
}

impl BookingRecord {
    /// Whether this record currently occupies a seat.
    pub fn holds_capacity(&self) -> bool {
        match &self.state {
            BookingState::Visit { status } => {
                matches!(status, VisitStatus::Booked | VisitStatus::Reserved)
            }
            BookingState::Application {
                reserved_slot,
                completed,
                ..
            } => *reserved_slot && !*completed,
        }
    }

    /// Whether this record is a live commitment for conflict purposes: a
    /// booked visit or a not-yet-completed application.
    pub fn live_commitment(&self) -> bool {
        match &self.state {
            BookingState::Visit { status } => *status == VisitStatus::Booked,
            BookingState::Application { completed, .. } => !completed,
        }
    }

    /// Slot identity match against a concrete occurrence's slot.
    pub fn matches_slot(
        &self,
        prison_code: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> bool {
        self.prison_code == prison_code
            && self.date == date
            && self.start_time == start_time
            && self.end_time == end_time
    }
}

/// What the prisoner directory knows about a prisoner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrisonerDetails {
    pub prisoner_id: String,
    pub prison_code: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub incentive_level: Option<String>,
    /// Raw current housing location, e.g. `"A-1-100-1"` or `"TAP"`.
    #[serde(default)]
    pub location: Option<String>,
    /// Last known permanent cell, used when the current location is
    /// transitional.
    #[serde(default)]
    pub last_permanent_location: Option<String>,
}

/// A pair of prisoners who must not visit on the same day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonAssociation {
    pub prisoner_id: String,
    pub other_prisoner_id: String,
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
}

impl NonAssociation {
    pub fn effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from.is_none_or(|from| date >= from)
            && self.effective_to.is_none_or(|to| date <= to)
    }

    /// The counterpart of `prisoner_id` in this link, if they are part of it.
    pub fn counterpart_of(&self, prisoner_id: &str) -> Option<&str> {
        if self.prisoner_id == prisoner_id {
            Some(&self.other_prisoner_id)
        } else if self.other_prisoner_id == prisoner_id {
            Some(&self.prisoner_id)
        } else {
            None
        }
    }
}
