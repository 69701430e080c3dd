//! Tests for the composed eligibility checks.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use visit_engine::eligibility::{assess, EligibilityContext, Ineligibility, PrisonerProfile};
use visit_engine::expander::SessionOccurrence;
use visit_engine::location::LocationPath;
use visit_engine::template::{
    ClientConfig, ClientType, DayOfWeek, GroupMode, NoticeWindow, Prison, RestrictionGroup,
    SessionTemplate,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn prison() -> Prison {
    let mut notice = BTreeMap::new();
    notice.insert(
        ClientType::Staff,
        NoticeWindow {
            min_days: 2,
            max_days: 28,
        },
    );
    Prison {
        code: "HEI".to_string(),
        active: true,
        timezone: "Europe/London".to_string(),
        exclude_dates: BTreeSet::new(),
        notice,
    }
}

fn template() -> SessionTemplate {
    SessionTemplate {
        reference: "MON-AFT".to_string(),
        name: String::new(),
        prison_code: "HEI".to_string(),
        valid_from: date(2024, 1, 1),
        valid_to: None,
        day_of_week: DayOfWeek::Monday,
        start_time: time(14, 0),
        end_time: time(15, 0),
        weekly_frequency: 1,
        open_capacity: 10,
        closed_capacity: 2,
        capacity_group: None,
        active: true,
        exclude_dates: BTreeSet::new(),
        clients: vec![ClientConfig {
            user_type: ClientType::Staff,
            active: true,
        }],
        category_groups: Vec::new(),
        incentive_groups: Vec::new(),
        location_groups: Vec::new(),
    }
}

fn occurrence_on(date: NaiveDate) -> SessionOccurrence {
    // The absolute timestamps play no part in eligibility; any value will do.
    SessionOccurrence {
        template_ref: "MON-AFT".to_string(),
        prison_code: "HEI".to_string(),
        date,
        start_time: time(14, 0),
        end_time: time(15, 0),
        start: Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap(),
    }
}

fn profile() -> PrisonerProfile {
    PrisonerProfile {
        prisoner_id: "A1234BC".to_string(),
        prison_code: "HEI".to_string(),
        category: Some("C".to_string()),
        incentive_level: Some("STD".to_string()),
        locations: vec![LocationPath::parse("A-1-100-1").unwrap()],
    }
}

fn group<T>(mode: GroupMode, members: Vec<T>) -> RestrictionGroup<T> {
    RestrictionGroup {
        name: "test group".to_string(),
        mode,
        members,
    }
}

/// Assess an occurrence on 2024-01-15 with today anchored at 2024-01-01.
fn assess_with(
    template: &SessionTemplate,
    prison: &Prison,
    prisoner: Option<&PrisonerProfile>,
) -> Option<Ineligibility> {
    let ctx = EligibilityContext {
        prison,
        client: ClientType::Staff,
        today: date(2024, 1, 1),
        prisoner,
    };
    assess(template, &occurrence_on(date(2024, 1, 15)), &ctx)
}

// ── Prison-level checks ─────────────────────────────────────────────────────

#[test]
fn inactive_prison_rejects_everything() {
    let mut prison = prison();
    prison.active = false;
    assert_eq!(
        assess_with(&template(), &prison, None),
        Some(Ineligibility::PrisonInactive)
    );
}

#[test]
fn prison_exclude_date_rejects_the_occurrence() {
    let mut prison = prison();
    prison.exclude_dates.insert(date(2024, 1, 15));
    assert_eq!(
        assess_with(&template(), &prison, None),
        Some(Ineligibility::PrisonExcludedDate)
    );
}

// ── Client authorization ────────────────────────────────────────────────────

#[test]
fn client_without_config_entry_is_rejected() {
    let mut template = template();
    template.clients.clear();
    assert_eq!(
        assess_with(&template, &prison(), None),
        Some(Ineligibility::ClientNotPermitted)
    );
}

#[test]
fn inactive_client_entry_is_rejected() {
    let mut template = template();
    template.clients[0].active = false;
    assert_eq!(
        assess_with(&template, &prison(), None),
        Some(Ineligibility::ClientNotPermitted)
    );
}

// ── Booking-notice window ───────────────────────────────────────────────────

#[test]
fn notice_window_is_inclusive_at_both_ends() {
    let prison = prison();
    let template = template();
    let ctx = EligibilityContext {
        prison: &prison,
        client: ClientType::Staff,
        today: date(2024, 1, 1),
        prisoner: None,
    };

    // min_days = 2: Jan 3 is the earliest bookable date, Jan 29 the latest.
    assert_eq!(assess(&template, &occurrence_on(date(2024, 1, 3)), &ctx), None);
    assert_eq!(assess(&template, &occurrence_on(date(2024, 1, 29)), &ctx), None);
    assert_eq!(
        assess(&template, &occurrence_on(date(2024, 1, 2)), &ctx),
        Some(Ineligibility::OutsideNoticeWindow)
    );
    assert_eq!(
        assess(&template, &occurrence_on(date(2024, 1, 30)), &ctx),
        Some(Ineligibility::OutsideNoticeWindow)
    );
}

#[test]
fn notice_min_above_max_admits_no_date_at_all() {
    let mut prison = prison();
    prison.notice.insert(
        ClientType::Staff,
        NoticeWindow {
            min_days: 14,
            max_days: 2,
        },
    );
    assert_eq!(
        assess_with(&template(), &prison, None),
        Some(Ineligibility::OutsideNoticeWindow)
    );
}

// ── Category groups ─────────────────────────────────────────────────────────

#[test]
fn include_list_rejects_a_category_outside_it() {
    let mut template = template();
    template.category_groups = vec![group(GroupMode::Include, vec!["A_HIGH".to_string()])];
    let mut prisoner = profile();
    prisoner.category = Some("B".to_string());
    assert_eq!(
        assess_with(&template, &prison(), Some(&prisoner)),
        Some(Ineligibility::CategoryGroup)
    );
}

#[test]
fn no_category_groups_means_no_category_restriction() {
    let mut prisoner = profile();
    prisoner.category = Some("B".to_string());
    assert_eq!(assess_with(&template(), &prison(), Some(&prisoner)), None);
}

#[test]
fn exclude_list_wins_over_an_include_list() {
    let mut template = template();
    template.category_groups = vec![
        group(GroupMode::Include, vec!["B".to_string(), "C".to_string()]),
        group(GroupMode::Exclude, vec!["B".to_string()]),
    ];

    let mut caught = profile();
    caught.category = Some("B".to_string());
    assert_eq!(
        assess_with(&template, &prison(), Some(&caught)),
        Some(Ineligibility::CategoryGroup)
    );

    let mut admitted = profile();
    admitted.category = Some("C".to_string());
    assert_eq!(assess_with(&template, &prison(), Some(&admitted)), None);
}

#[test]
fn null_category_never_hits_any_group() {
    let mut prisoner = profile();
    prisoner.category = None;

    let mut include_only = template();
    include_only.category_groups = vec![group(GroupMode::Include, vec!["A_HIGH".to_string()])];
    assert_eq!(
        assess_with(&include_only, &prison(), Some(&prisoner)),
        Some(Ineligibility::CategoryGroup)
    );

    let mut exclude_only = template();
    exclude_only.category_groups = vec![group(GroupMode::Exclude, vec!["A_HIGH".to_string()])];
    assert_eq!(assess_with(&exclude_only, &prison(), Some(&prisoner)), None);
}

// ── Incentive-level groups ──────────────────────────────────────────────────

#[test]
fn null_incentive_level_is_distinct_from_every_configured_level() {
    let mut prisoner = profile();
    prisoner.incentive_level = None;

    // An exclude-enhanced template still admits a prisoner with no level.
    let mut exclude_enhanced = template();
    exclude_enhanced.incentive_groups = vec![group(GroupMode::Exclude, vec!["ENH".to_string()])];
    assert_eq!(assess_with(&exclude_enhanced, &prison(), Some(&prisoner)), None);

    // An include-enhanced-only template rejects them.
    let mut include_enhanced = template();
    include_enhanced.incentive_groups = vec![group(GroupMode::Include, vec!["ENH".to_string()])];
    assert_eq!(
        assess_with(&include_enhanced, &prison(), Some(&prisoner)),
        Some(Ineligibility::IncentiveGroup)
    );
}

#[test]
fn incentive_include_list_admits_a_matching_level() {
    let mut template = template();
    template.incentive_groups = vec![group(GroupMode::Include, vec!["STD".to_string()])];
    assert_eq!(assess_with(&template, &prison(), Some(&profile())), None);
}

// ── Location groups ─────────────────────────────────────────────────────────

#[test]
fn location_include_group_admits_a_cell_under_its_prefix() {
    let mut template = template();
    template.location_groups = vec![group(
        GroupMode::Include,
        vec![LocationPath::parse("A-1-100").unwrap()],
    )];
    assert_eq!(assess_with(&template, &prison(), Some(&profile())), None);
}

#[test]
fn location_include_group_rejects_another_wing() {
    let mut template = template();
    template.location_groups = vec![group(
        GroupMode::Include,
        vec![LocationPath::parse("B").unwrap()],
    )];
    assert_eq!(
        assess_with(&template, &prison(), Some(&profile())),
        Some(Ineligibility::LocationGroup)
    );
}

#[test]
fn unresolvable_location_fails_any_location_restricted_template() {
    let mut prisoner = profile();
    prisoner.locations = Vec::new();

    let mut restricted = template();
    restricted.location_groups = vec![group(
        GroupMode::Exclude,
        vec![LocationPath::parse("A").unwrap()],
    )];
    assert_eq!(
        assess_with(&restricted, &prison(), Some(&prisoner)),
        Some(Ineligibility::LocationGroup)
    );

    // No location restriction — still matches.
    assert_eq!(assess_with(&template(), &prison(), Some(&prisoner)), None);
}

#[test]
fn transitional_prisoner_matches_via_the_fallback_cell() {
    let mut template = template();
    template.location_groups = vec![group(
        GroupMode::Include,
        vec![LocationPath::parse("A-1-100").unwrap()],
    )];
    let mut prisoner = profile();
    prisoner.locations = vec![
        LocationPath::single("COURT"),
        LocationPath::parse("A-1-100-1").unwrap(),
    ];
    assert_eq!(assess_with(&template, &prison(), Some(&prisoner)), None);
}

// ── No prisoner in scope ────────────────────────────────────────────────────

#[test]
fn prisoner_specific_checks_are_skipped_without_a_prisoner() {
    let mut template = template();
    template.category_groups = vec![group(GroupMode::Include, vec!["A_HIGH".to_string()])];
    template.location_groups = vec![group(
        GroupMode::Include,
        vec![LocationPath::parse("Z").unwrap()],
    )];
    assert_eq!(assess_with(&template, &prison(), None), None);
}
