//! Recurrence expansion -- session templates into concrete occurrences.
//!
//! Builds an RFC 5545 rule from a template's recurrence fields and expands it
//! through the `rrule` crate, so weekly stepping, bi-weekly parity and
//! exception dates all follow calendar semantics rather than hand-rolled date
//! arithmetic. Slot times are wall-clock local to the prison's timezone: a
//! 14:00 session stays 14:00 across DST transitions and the UTC timestamps
//! shift offset instead.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rrule::RRuleSet;
use serde::Serialize;

use crate::error::{Result, VisitError};
use crate::template::{DateRange, SessionTemplate};

/// Cap on raw instances drawn from one rule. Visit queries span weeks, not
/// years, so this is far above any real window.
const EXPANSION_LIMIT: u16 = 500;

/// One concrete, bookable instance of a session template. Derived on demand,
/// never stored, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOccurrence {
    pub template_ref: String,
    pub prison_code: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Absolute start, prison-local wall clock mapped to UTC.
    pub start: DateTime<Utc>,
    /// Absolute end, same offset as `start`.
    pub end: DateTime<Utc>,
}

/// Expand a template into its occurrences inside a closed date window.
///
/// The first occurrence is the first `day_of_week` at or after `valid_from` —
/// not `valid_from` itself when the weekdays differ. Bi-weekly parity is
/// anchored there, so two queries with different windows against the same
/// template land on the same absolute dates; the anchor is only ever advanced
/// toward the window in whole recurrence steps. Template exception dates are
/// injected as EXDATE lines. Returns occurrences in ascending date order.
///
/// # Errors
///
/// Returns `VisitError::InvalidTimezone` if `timezone` is not a valid IANA
/// identifier, and `VisitError::Expansion` for a template whose recurrence
/// fields cannot form a valid rule.
pub fn expand(
    template: &SessionTemplate,
    timezone: &str,
    window: &DateRange,
) -> Result<Vec<SessionOccurrence>> {
    // Validate the timezone by parsing it as a chrono-tz Tz.
    let tz: chrono_tz::Tz = timezone
        .parse()
        .map_err(|_| VisitError::InvalidTimezone(timezone.to_string()))?;

    if template.weekly_frequency == 0 {
        return Err(expansion_error(template, "weekly_frequency must be at least 1"));
    }
    if template.end_time <= template.start_time {
        return Err(expansion_error(template, "slot end time must be after its start time"));
    }

    // Clip the horizon to both the window and the template's validity.
    let horizon = match template.valid_to {
        Some(valid_to) => valid_to.min(window.to),
        None => window.to,
    };
    if horizon < template.valid_from {
        return Ok(Vec::new());
    }

    // Anchor: the first matching weekday at or after valid_from. Bi-weekly
    // parity is fixed here for the template's whole lifetime.
    let anchor = template.day_of_week.on_or_after(template.valid_from);
    if anchor > horizon {
        return Ok(Vec::new());
    }

    // Fast-forward the anchor toward the window start in whole recurrence
    // steps, keeping parity, so old templates don't expand years of
    // instances nobody asked for.
    let step_days = 7 * i64::from(template.weekly_frequency);
    let dtstart_date = if window.from > anchor {
        let steps = (window.from - anchor).num_days() / step_days;
        anchor + Duration::days(steps * step_days)
    } else {
        anchor
    };

    // Build the iCalendar text block. DTSTART carries the prison-local TZID;
    // the rrule crate requires UNTIL to be given in UTC (trailing Z) whenever
    // DTSTART uses a non-UTC zone, so express the same horizon instant --
    // `horizon` at the slot start time, prison-local -- converted to UTC.
    let dtstart_ical = ical_datetime(dtstart_date, template.start_time);
    let until_local = horizon.and_time(template.start_time);
    let until_utc = tz
        .from_local_datetime(&until_local)
        .earliest()
        .ok_or_else(|| expansion_error(template, "horizon falls in a timezone gap"))?
        .with_timezone(&Utc);
    let until_ical = format!("{}Z", ical_datetime(until_utc.date_naive(), until_utc.time()));
    let mut rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:FREQ=WEEKLY;INTERVAL={};BYDAY={};UNTIL={}",
        timezone,
        dtstart_ical,
        template.weekly_frequency,
        template.day_of_week.byday(),
        until_ical
    );

    // Exception dates become EXDATE entries at the slot's start time. Dates
    // outside the expanded range can never match an instance, so skip them.
    let exdates: Vec<String> = template
        .exclude_dates
        .iter()
        .filter(|d| **d >= dtstart_date && **d <= horizon)
        .map(|d| ical_datetime(*d, template.start_time))
        .collect();
    if !exdates.is_empty() {
        rrule_text.push_str(&format!("\nEXDATE;TZID={}:{}", timezone, exdates.join(",")));
    }

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| expansion_error(template, &format!("{e}")))?;

    // The .all(limit) cap counts instances before EXDATE filtering, so give
    // it headroom for every exception that might be swallowed.
    let limit = EXPANSION_LIMIT.saturating_add(exdates.len() as u16);
    let instances = rrule_set.all(limit);
    if instances.limited {
        tracing::warn!(
            template = %template.reference,
            "expansion hit the instance cap; occurrences may be missing"
        );
    }

    let slot_length = template.end_time - template.start_time;
    let occurrences = instances
        .dates
        .into_iter()
        .filter_map(|dt| {
            let date = dt.date_naive();
            // The fast-forwarded anchor can land one step before the window.
            if !window.contains(date) {
                return None;
            }
            let start: DateTime<Utc> = dt.with_timezone(&Utc);
            Some(SessionOccurrence {
                template_ref: template.reference.clone(),
                prison_code: template.prison_code.clone(),
                date,
                start_time: template.start_time,
                end_time: template.end_time,
                start,
                end: start + slot_length,
            })
        })
        .collect();

    Ok(occurrences)
}

fn ical_datetime(date: NaiveDate, time: NaiveTime) -> String {
    format!("{}T{}", date.format("%Y%m%d"), time.format("%H%M%S"))
}

fn expansion_error(template: &SessionTemplate, message: &str) -> VisitError {
    VisitError::Expansion {
        reference: template.reference.clone(),
        message: message.to_string(),
    }
}
