//! Per-occurrence eligibility -- one accept/reject decision per
//! (occurrence, prisoner) pair.
//!
//! Composes the prison-level, client-authorization, booking-notice, category,
//! incentive-level and location checks. All must pass. A template carrying no
//! restriction groups at all is open to any prisoner who clears the first
//! three checks.

use tracing::debug;

use crate::booking::PrisonerDetails;
use crate::expander::SessionOccurrence;
use crate::location::{self, LocationPath};
use crate::template::{permitted_by, ClientType, Prison, SessionTemplate};

/// A prisoner's attributes as the filters see them, resolved once per query.
#[derive(Debug, Clone)]
pub struct PrisonerProfile {
    pub prisoner_id: String,
    pub prison_code: String,
    pub category: Option<String>,
    pub incentive_level: Option<String>,
    /// Ordered candidate locations; empty when nothing could be resolved.
    pub locations: Vec<LocationPath>,
}

impl PrisonerProfile {
    pub fn from_details(details: &PrisonerDetails) -> Self {
        Self {
            prisoner_id: details.prisoner_id.clone(),
            prison_code: details.prison_code.clone(),
            category: details.category.clone(),
            incentive_level: details.incentive_level.clone(),
            locations: location::candidate_paths(
                details.location.as_deref(),
                details.last_permanent_location.as_deref(),
            ),
        }
    }
}

/// The check an occurrence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    PrisonInactive,
    PrisonExcludedDate,
    ClientNotPermitted,
    OutsideNoticeWindow,
    CategoryGroup,
    IncentiveGroup,
    LocationGroup,
}

/// Query-scoped inputs shared by every occurrence assessed in it.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub prison: &'a Prison,
    pub client: ClientType,
    pub today: chrono::NaiveDate,
    /// `None` for queries with no prisoner in scope (e.g. a staff overview);
    /// the prisoner-specific checks are then skipped.
    pub prisoner: Option<&'a PrisonerProfile>,
}

/// Assess one occurrence. Returns the first failed check, or `None` when the
/// occurrence is eligible.
pub fn assess(
    template: &SessionTemplate,
    occurrence: &SessionOccurrence,
    ctx: &EligibilityContext<'_>,
) -> Option<Ineligibility> {
    let verdict = assess_inner(template, occurrence, ctx);
    if let Some(why) = verdict {
        debug!(
            template = %template.reference,
            date = %occurrence.date,
            check = ?why,
            "occurrence rejected"
        );
    }
    verdict
}

fn assess_inner(
    template: &SessionTemplate,
    occurrence: &SessionOccurrence,
    ctx: &EligibilityContext<'_>,
) -> Option<Ineligibility> {
    if !ctx.prison.active {
        return Some(Ineligibility::PrisonInactive);
    }
    if ctx.prison.exclude_dates.contains(&occurrence.date) {
        return Some(Ineligibility::PrisonExcludedDate);
    }
    if !template.permits_client(ctx.client) {
        return Some(Ineligibility::ClientNotPermitted);
    }
    // Inclusive at both ends; a min above max simply admits no date.
    if !ctx
        .prison
        .notice_window(ctx.client)
        .admits(ctx.today, occurrence.date)
    {
        return Some(Ineligibility::OutsideNoticeWindow);
    }

    let Some(prisoner) = ctx.prisoner else {
        return None;
    };

    // A null category or incentive level is distinct from every configured
    // code: it never hits an include group and never trips an exclude group.
    if !permitted_by(&template.category_groups, |group| {
        code_in(prisoner.category.as_deref(), &group.members)
    }) {
        return Some(Ineligibility::CategoryGroup);
    }
    if !permitted_by(&template.incentive_groups, |group| {
        code_in(prisoner.incentive_level.as_deref(), &group.members)
    }) {
        return Some(Ineligibility::IncentiveGroup);
    }

    // An unresolvable location fails any location-restricted template, even
    // an exclude-only one.
    if !template.location_groups.is_empty() && prisoner.locations.is_empty() {
        return Some(Ineligibility::LocationGroup);
    }
    if !permitted_by(&template.location_groups, |group| {
        prisoner
            .locations
            .iter()
            .any(|candidate| group.members.iter().any(|entry| entry.matches(candidate)))
    }) {
        return Some(Ineligibility::LocationGroup);
    }

    None
}

fn code_in(code: Option<&str>, members: &[String]) -> bool {
    code.is_some_and(|c| members.iter().any(|m| m == c))
}
