//! Session templates, prison configuration and restriction groups.
//!
//! A [`SessionTemplate`] is a recurrence rule describing a weekly, bi-weekly
//! or one-off visiting slot, together with its capacity and the restriction
//! groups that gate which prisoners may use it. Templates and prisons are
//! read-only inputs: administration of them happens elsewhere.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VisitError};
use crate::location::LocationPath;

/// A closed calendar date window `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(VisitError::Validation(format!(
                "date window start {from} is after its end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Single-day window.
    pub fn on(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

/// The kind of client issuing a query. `System` is only valid for internal
/// plumbing and is rejected up front by the eligibility queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientType {
    Staff,
    Public,
    System,
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ClientType::Staff => "STAFF",
            ClientType::Public => "PUBLIC",
            ClientType::System => "SYSTEM",
        };
        write!(f, "{name}")
    }
}

/// Per-template client authorization entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub user_type: ClientType,
    pub active: bool,
}

/// Day of the week a template recurs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn weekday(self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }

    /// RFC 5545 BYDAY code.
    pub fn byday(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MO",
            DayOfWeek::Tuesday => "TU",
            DayOfWeek::Wednesday => "WE",
            DayOfWeek::Thursday => "TH",
            DayOfWeek::Friday => "FR",
            DayOfWeek::Saturday => "SA",
            DayOfWeek::Sunday => "SU",
        }
    }

    /// First date on this weekday at or after `date`.
    pub fn on_or_after(self, date: NaiveDate) -> NaiveDate {
        let ahead =
            (7 + self.weekday().num_days_from_monday() - date.weekday().num_days_from_monday()) % 7;
        date + Duration::days(ahead as i64)
    }
}

/// Whether a restriction group admits or bars its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupMode {
    Include,
    Exclude,
}

/// A named set of values a template is restricted by — category codes,
/// incentive-level codes or location paths, each tagged include or exclude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionGroup<T> {
    #[serde(default)]
    pub name: String,
    pub mode: GroupMode,
    pub members: Vec<T>,
}

/// The one accept rule shared by the category, incentive-level and location
/// filters. `hit` reports whether a group's members cover the prisoner.
///
/// Any exclude group that hits bars the prisoner. If include groups exist,
/// at least one must hit. No groups at all means no restriction.
pub fn permitted_by<T>(
    groups: &[RestrictionGroup<T>],
    mut hit: impl FnMut(&RestrictionGroup<T>) -> bool,
) -> bool {
    let mut any_include = false;
    let mut include_hit = false;
    for group in groups {
        match group.mode {
            GroupMode::Exclude => {
                if hit(group) {
                    return false;
                }
            }
            GroupMode::Include => {
                any_include = true;
                if !include_hit && hit(group) {
                    include_hit = true;
                }
            }
        }
    }
    !any_include || include_hit
}

/// Allowed booking lead time, in whole days from "today", both ends
/// inclusive. A window with `min_days > max_days` admits no date at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeWindow {
    pub min_days: u32,
    pub max_days: u32,
}

impl Default for NoticeWindow {
    fn default() -> Self {
        Self {
            min_days: 0,
            max_days: 28,
        }
    }
}

impl NoticeWindow {
    /// `date` falls within `[today + min_days, today + max_days]`.
    pub fn admits(&self, today: NaiveDate, date: NaiveDate) -> bool {
        let earliest = today + Duration::days(self.min_days as i64);
        let latest = today + Duration::days(self.max_days as i64);
        date >= earliest && date <= latest
    }
}

fn default_timezone() -> String {
    "Europe/London".to_string()
}

fn default_true() -> bool {
    true
}

fn default_frequency() -> u8 {
    1
}

/// Prison-level configuration consumed by the eligibility checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prison {
    pub code: String,
    #[serde(default = "default_true")]
    pub active: bool,
    /// IANA timezone the prison's slot times are local to.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Dates on which no session runs, prison-wide.
    #[serde(default)]
    pub exclude_dates: BTreeSet<NaiveDate>,
    /// Booking notice policy per client type.
    #[serde(default)]
    pub notice: BTreeMap<ClientType, NoticeWindow>,
}

impl Prison {
    pub fn notice_window(&self, client: ClientType) -> NoticeWindow {
        self.notice.get(&client).copied().unwrap_or_default()
    }
}

/// A recurrence rule for a bookable visiting slot.
///
/// `weekly_frequency` of 1 recurs every week, 2 every other week; bi-weekly
/// parity is anchored at the first `day_of_week` on or after `valid_from`,
/// never at the query date. `valid_to` of `None` means open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTemplate {
    pub reference: String,
    #[serde(default)]
    pub name: String,
    pub prison_code: String,
    pub valid_from: NaiveDate,
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_frequency")]
    pub weekly_frequency: u8,
    pub open_capacity: u32,
    pub closed_capacity: u32,
    /// Non-null key pooling this template's capacity with others sharing it.
    #[serde(default)]
    pub capacity_group: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub exclude_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub clients: Vec<ClientConfig>,
    #[serde(default)]
    pub category_groups: Vec<RestrictionGroup<String>>,
    #[serde(default)]
    pub incentive_groups: Vec<RestrictionGroup<String>>,
    #[serde(default)]
    pub location_groups: Vec<RestrictionGroup<LocationPath>>,
}

impl SessionTemplate {
    /// Whether `client` has an active authorization entry on this template.
    pub fn permits_client(&self, client: ClientType) -> bool {
        self.clients
            .iter()
            .any(|c| c.user_type == client && c.active)
    }

    /// Whether `date` falls inside the template's validity range.
    pub fn valid_on(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_to.is_none_or(|to| date <= to)
    }
}
