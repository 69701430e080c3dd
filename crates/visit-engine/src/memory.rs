//! In-memory store over a serde-loadable scenario bundle.
//!
//! Backs the CLI and the integration tests. Not a production store: every
//! lookup is a linear scan over the loaded vectors.

use serde::{Deserialize, Serialize};

use crate::booking::{BookingRecord, NonAssociation, PrisonerDetails};
use crate::store::{
    BookingStore, LookupError, LookupResult, NonAssociationDirectory, PrisonerDirectory,
    TemplateStore,
};
use crate::template::{DateRange, Prison, SessionTemplate};

/// Everything one self-contained scheduling world consists of.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub prisons: Vec<Prison>,
    #[serde(default)]
    pub templates: Vec<SessionTemplate>,
    #[serde(default)]
    pub prisoners: Vec<PrisonerDetails>,
    #[serde(default)]
    pub bookings: Vec<BookingRecord>,
    #[serde(default)]
    pub non_associations: Vec<NonAssociation>,
}

/// A [`Scenario`] exposed through all four collaborator seams.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub scenario: Scenario,
}

impl From<Scenario> for MemoryStore {
    fn from(scenario: Scenario) -> Self {
        Self { scenario }
    }
}

impl TemplateStore for MemoryStore {
    fn prison(&self, code: &str) -> LookupResult<Option<Prison>> {
        Ok(self
            .scenario
            .prisons
            .iter()
            .find(|p| p.code == code)
            .cloned())
    }

    fn templates_for(
        &self,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<SessionTemplate>> {
        Ok(self
            .scenario
            .templates
            .iter()
            .filter(|t| {
                t.prison_code == prison_code
                    && t.valid_from <= window.to
                    && t.valid_to.is_none_or(|to| to >= window.from)
            })
            .cloned()
            .collect())
    }

    fn templates_in_group(
        &self,
        prison_code: &str,
        capacity_group: &str,
    ) -> LookupResult<Vec<SessionTemplate>> {
        Ok(self
            .scenario
            .templates
            .iter()
            .filter(|t| {
                t.prison_code == prison_code
                    && t.capacity_group.as_deref() == Some(capacity_group)
            })
            .cloned()
            .collect())
    }
}

impl BookingStore for MemoryStore {
    fn records_for_window(
        &self,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<BookingRecord>> {
        Ok(self
            .scenario
            .bookings
            .iter()
            .filter(|r| r.prison_code == prison_code && window.contains(r.date))
            .cloned()
            .collect())
    }

    fn records_for_prisoner(
        &self,
        prisoner_id: &str,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<BookingRecord>> {
        Ok(self
            .scenario
            .bookings
            .iter()
            .filter(|r| {
                r.prisoner_id == prisoner_id
                    && r.prison_code == prison_code
                    && window.contains(r.date)
            })
            .cloned()
            .collect())
    }
}

impl PrisonerDirectory for MemoryStore {
    fn resolve(&self, prisoner_id: &str) -> LookupResult<PrisonerDetails> {
        self.scenario
            .prisoners
            .iter()
            .find(|p| p.prisoner_id == prisoner_id)
            .cloned()
            .ok_or(LookupError::NoData)
    }
}

impl NonAssociationDirectory for MemoryStore {
    fn resolve(&self, prisoner_id: &str) -> LookupResult<Vec<NonAssociation>> {
        Ok(self
            .scenario
            .non_associations
            .iter()
            .filter(|link| link.counterpart_of(prisoner_id).is_some())
            .cloned()
            .collect())
    }
}
