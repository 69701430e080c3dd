//! Session availability queries -- the composition of expansion, eligibility,
//! capacity and conflict accounting.
//!
//! [`SessionService`] is the engine's outward face. Its queries are pure
//! reads: bookings for the whole window are fetched once per query (a single
//! snapshot, never per occurrence), results are deterministic — ascending by
//! date, then slot start time, then template reference — and calling the same
//! query twice with unchanged stores yields identical output.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::booking::{BookingRecord, Restriction};
use crate::capacity::{self, CapacityPools, SessionCapacity, SlotUsage};
use crate::conflict::{self, ConflictKind};
use crate::eligibility::{self, EligibilityContext, PrisonerProfile};
use crate::error::{Result, VisitError};
use crate::expander::{self, SessionOccurrence};
use crate::store::{
    BookingStore, LookupError, NonAssociationDirectory, PrisonerDirectory, TemplateStore,
};
use crate::template::{ClientType, DateRange, SessionTemplate};

/// Inputs to the session listing queries.
#[derive(Debug, Clone)]
pub struct SessionsRequest {
    pub prison_code: String,
    pub window: DateRange,
    /// Prisoner in scope. Required for available-sessions queries; optional
    /// for the all-sessions listing (a staff overview has none).
    pub prisoner_id: Option<String>,
    pub client: ClientType,
    /// The booking user, so their own in-progress application is not read as
    /// a double booking.
    pub username: Option<String>,
    /// Anchor date for the booking-notice window. Injected rather than read
    /// from a clock so queries stay reproducible.
    pub today: NaiveDate,
}

/// One schedulable session in a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitSession {
    #[serde(flatten)]
    pub occurrence: SessionOccurrence,
    /// Pooled capacity the occurrence is booked against.
    pub capacity: SessionCapacity,
    /// Seats currently in use, per channel.
    pub booked: SlotUsage,
    pub conflicts: BTreeSet<ConflictKind>,
}

impl VisitSession {
    /// Seats left in `restriction`'s channel.
    pub fn remaining(&self, restriction: Restriction) -> u32 {
        match restriction {
            Restriction::Open => self.capacity.open.saturating_sub(self.booked.open),
            Restriction::Closed => self.capacity.closed.saturating_sub(self.booked.closed),
            Restriction::Unknown => 0,
        }
    }
}

/// The availability orchestrator, generic over the four collaborator seams.
pub struct SessionService<T, B, P, N> {
    templates: T,
    bookings: B,
    prisoners: P,
    non_associations: N,
}

impl<T, B, P, N> SessionService<T, B, P, N>
where
    T: TemplateStore,
    B: BookingStore,
    P: PrisonerDirectory,
    N: NonAssociationDirectory,
{
    pub fn new(templates: T, bookings: B, prisoners: P, non_associations: N) -> Self {
        Self {
            templates,
            bookings,
            prisoners,
            non_associations,
        }
    }

    /// Every schedulable session in the window, annotated with conflicts and
    /// booked counts. Full slots and conflicted slots are included.
    pub fn list_sessions(&self, request: &SessionsRequest) -> Result<Vec<VisitSession>> {
        debug!(
            prison = %request.prison_code,
            from = %request.window.from,
            to = %request.window.to,
            client = %request.client,
            "listing sessions"
        );
        self.assemble(request)
    }

    /// The sessions the prisoner can actually book: conflicted occurrences
    /// and occurrences with no seat left in `restriction`'s channel are
    /// dropped.
    pub fn list_available_sessions(
        &self,
        request: &SessionsRequest,
        restriction: Restriction,
    ) -> Result<Vec<VisitSession>> {
        if restriction == Restriction::Unknown {
            return Err(VisitError::Validation(
                "available-sessions queries must name an OPEN or CLOSED restriction".to_string(),
            ));
        }
        if request.prisoner_id.is_none() {
            return Err(VisitError::Validation(
                "available-sessions queries require a prisoner".to_string(),
            ));
        }
        let mut sessions = self.assemble(request)?;
        sessions.retain(|s| s.conflicts.is_empty() && s.remaining(restriction) > 0);
        Ok(sessions)
    }

    /// Pooled open/closed capacity of the single slot at `date`,
    /// `start_time`–`end_time`. Errors with `NotFound` when no template puts
    /// a session there.
    pub fn compute_capacity(
        &self,
        prison_code: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<SessionCapacity> {
        validate_prison_code(prison_code)?;
        let prison = self.fetch_prison(prison_code)?;
        let window = DateRange::on(date);
        let templates = self.fetch_templates(prison_code, &window)?;

        let mut matching: Vec<&SessionTemplate> = Vec::new();
        for template in &templates {
            let occurrences = expander::expand(template, &prison.timezone, &window)?;
            if occurrences
                .iter()
                .any(|o| o.date == date && o.start_time == start_time && o.end_time == end_time)
            {
                matching.push(template);
            }
        }
        if matching.is_empty() {
            return Err(VisitError::NotFound {
                entity: "session slot",
                reference: format!("{prison_code} {date} {start_time}-{end_time}"),
            });
        }

        // Sum each matching template's pool exactly once, counting every
        // pool member that is live on the date.
        let mut total = SessionCapacity::default();
        let mut seen_refs: BTreeSet<String> = BTreeSet::new();
        let mut seen_groups: BTreeSet<String> = BTreeSet::new();
        for template in matching {
            match &template.capacity_group {
                Some(group) => {
                    if !seen_groups.insert(group.clone()) {
                        continue;
                    }
                    let members = normalize_no_data(
                        self.templates.templates_in_group(prison_code, group),
                        "template store",
                    )?;
                    for member in members {
                        if member.active
                            && member.valid_on(date)
                            && seen_refs.insert(member.reference.clone())
                        {
                            total.open += member.open_capacity;
                            total.closed += member.closed_capacity;
                        }
                    }
                }
                None => {
                    if seen_refs.insert(template.reference.clone()) {
                        total.open += template.open_capacity;
                        total.closed += template.closed_capacity;
                    }
                }
            }
        }
        Ok(total)
    }

    /// The shared pipeline: expand, filter, count, flag, order.
    fn assemble(&self, request: &SessionsRequest) -> Result<Vec<VisitSession>> {
        validate_request(request)?;
        let prison = self.fetch_prison(&request.prison_code)?;

        let profile = match &request.prisoner_id {
            Some(prisoner_id) => Some(self.resolve_prisoner(prisoner_id, &request.prison_code)?),
            None => None,
        };

        let templates = self.fetch_templates(&request.prison_code, &request.window)?;

        let mut occurrences: Vec<(usize, SessionOccurrence)> = Vec::new();
        for (index, template) in templates.iter().enumerate() {
            for occurrence in expander::expand(template, &prison.timezone, &request.window)? {
                occurrences.push((index, occurrence));
            }
        }

        let ctx = EligibilityContext {
            prison: &prison,
            client: request.client,
            today: request.today,
            prisoner: profile.as_ref(),
        };
        occurrences
            .retain(|(index, occurrence)| eligibility::assess(&templates[*index], occurrence, &ctx).is_none());

        let pools = CapacityPools::resolve(&templates);
        let records = normalize_no_data(
            self.bookings
                .records_for_window(&request.prison_code, &request.window),
            "booking store",
        )?;

        let (own_records, blocked_days) = match &request.prisoner_id {
            Some(prisoner_id) => self.conflict_inputs(prisoner_id, request)?,
            None => (Vec::new(), BTreeSet::new()),
        };

        let mut sessions: Vec<VisitSession> = occurrences
            .into_iter()
            .map(|(_, occurrence)| {
                let pool = pools
                    .for_template(&occurrence.template_ref)
                    .cloned()
                    .unwrap_or_default();
                let booked = capacity::count_usage(&occurrence, &pool.members, &records);

                let mut conflicts = BTreeSet::new();
                if request.prisoner_id.is_some() {
                    if conflict::own_slot_conflict(
                        &occurrence,
                        &own_records,
                        request.username.as_deref(),
                    ) {
                        conflicts.insert(ConflictKind::DoubleBookingOrReservation);
                    }
                    if blocked_days.contains(&occurrence.date) {
                        conflicts.insert(ConflictKind::NonAssociation);
                    }
                }

                VisitSession {
                    occurrence,
                    capacity: pool.capacity,
                    booked,
                    conflicts,
                }
            })
            .collect();

        sessions.sort_by(|a, b| {
            (a.occurrence.date, a.occurrence.start_time, &a.occurrence.template_ref).cmp(&(
                b.occurrence.date,
                b.occurrence.start_time,
                &b.occurrence.template_ref,
            ))
        });
        Ok(sessions)
    }

    /// The prisoner's own records plus the days blocked by non-associated
    /// prisoners' commitments. Counterpart bookings are fetched once per
    /// linked prisoner for the whole window.
    fn conflict_inputs(
        &self,
        prisoner_id: &str,
        request: &SessionsRequest,
    ) -> Result<(Vec<BookingRecord>, BTreeSet<NaiveDate>)> {
        let own_records = normalize_no_data(
            self.bookings
                .records_for_prisoner(prisoner_id, &request.prison_code, &request.window),
            "booking store",
        )?;

        let links = match self.non_associations.resolve(prisoner_id) {
            Ok(links) => links,
            Err(LookupError::NoData) => Vec::new(),
            Err(LookupError::Unavailable(message)) => {
                return Err(VisitError::Upstream {
                    context: format!("non-association directory, prisoner {prisoner_id}"),
                    message,
                })
            }
        };

        let mut counterpart_records: BTreeMap<String, Vec<BookingRecord>> = BTreeMap::new();
        for link in &links {
            let Some(other) = link.counterpart_of(prisoner_id) else {
                continue;
            };
            if counterpart_records.contains_key(other) {
                continue;
            }
            let records = normalize_no_data(
                self.bookings
                    .records_for_prisoner(other, &request.prison_code, &request.window),
                "booking store",
            )?;
            counterpart_records.insert(other.to_string(), records);
        }

        let blocked_days = conflict::non_association_days(
            prisoner_id,
            &links,
            &counterpart_records,
            &request.prison_code,
            &request.window,
        );
        Ok((own_records, blocked_days))
    }

    fn fetch_prison(&self, prison_code: &str) -> Result<crate::template::Prison> {
        match self.templates.prison(prison_code) {
            Ok(Some(prison)) => Ok(prison),
            Ok(None) | Err(LookupError::NoData) => Err(VisitError::NotFound {
                entity: "prison",
                reference: prison_code.to_string(),
            }),
            Err(LookupError::Unavailable(message)) => Err(VisitError::Upstream {
                context: format!("prison config, prison {prison_code}"),
                message,
            }),
        }
    }

    fn fetch_templates(
        &self,
        prison_code: &str,
        window: &DateRange,
    ) -> Result<Vec<SessionTemplate>> {
        let templates = normalize_no_data(
            self.templates.templates_for(prison_code, window),
            "template store",
        )?;
        Ok(templates.into_iter().filter(|t| t.active).collect())
    }

    fn resolve_prisoner(&self, prisoner_id: &str, prison_code: &str) -> Result<PrisonerProfile> {
        let details = match self.prisoners.resolve(prisoner_id) {
            Ok(details) => details,
            Err(LookupError::NoData) => {
                return Err(VisitError::NotFound {
                    entity: "prisoner",
                    reference: prisoner_id.to_string(),
                })
            }
            Err(LookupError::Unavailable(message)) => {
                return Err(VisitError::Upstream {
                    context: format!("prisoner directory, prisoner {prisoner_id}"),
                    message,
                })
            }
        };
        if details.prison_code != prison_code {
            return Err(VisitError::PrisonMismatch {
                prisoner_id: prisoner_id.to_string(),
                requested_prison: prison_code.to_string(),
                actual_prison: details.prison_code,
            });
        }
        Ok(PrisonerProfile::from_details(&details))
    }
}

fn validate_request(request: &SessionsRequest) -> Result<()> {
    validate_prison_code(&request.prison_code)?;
    if request.window.from > request.window.to {
        return Err(VisitError::Validation(format!(
            "date window start {} is after its end {}",
            request.window.from, request.window.to
        )));
    }
    if request.client == ClientType::System {
        return Err(VisitError::Validation(
            "SYSTEM clients are not permitted to run eligibility queries".to_string(),
        ));
    }
    Ok(())
}

fn validate_prison_code(code: &str) -> Result<()> {
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(VisitError::Validation(format!(
            "malformed prison code: {code:?}"
        )));
    }
    Ok(())
}

fn normalize_no_data<V>(
    result: std::result::Result<Vec<V>, LookupError>,
    context: &str,
) -> Result<Vec<V>> {
    match result {
        Ok(values) => Ok(values),
        Err(LookupError::NoData) => Ok(Vec::new()),
        Err(LookupError::Unavailable(message)) => Err(VisitError::Upstream {
            context: context.to_string(),
            message,
        }),
    }
}
