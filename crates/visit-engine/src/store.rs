//! Collaborator seams.
//!
//! The engine is a pure computation over data held elsewhere; these traits
//! are the only way it reaches that data. Backends decide where the data
//! lives — the engine only requires that lookups be read-only and idempotent.
//!
//! A lookup that finds nothing is not a failure: backends report it as
//! [`LookupError::NoData`] and the engine normalizes it to an empty result or
//! a precise `NotFound`, depending on the call site. Every other failure is
//! [`LookupError::Unavailable`] and surfaces as `VisitError::Upstream`,
//! retryable by the calling layer.

use thiserror::Error;

use crate::booking::{BookingRecord, NonAssociation, PrisonerDetails};
use crate::template::{DateRange, Prison, SessionTemplate};

#[derive(Error, Debug)]
pub enum LookupError {
    /// The collaborator has no record for the subject of the lookup.
    #[error("no data")]
    NoData,

    /// The collaborator failed for any reason other than "no data".
    #[error("unavailable: {0}")]
    Unavailable(String),
}

pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Session templates and prison configuration.
pub trait TemplateStore {
    /// Prison configuration by code; `None` for an unknown prison.
    fn prison(&self, code: &str) -> LookupResult<Option<Prison>>;

    /// Templates at a prison whose validity range intersects `window`.
    fn templates_for(&self, prison_code: &str, window: &DateRange)
        -> LookupResult<Vec<SessionTemplate>>;

    /// All templates pooling capacity under `capacity_group` at a prison.
    fn templates_in_group(
        &self,
        prison_code: &str,
        capacity_group: &str,
    ) -> LookupResult<Vec<SessionTemplate>>;
}

/// Booked visits and in-progress applications.
pub trait BookingStore {
    /// Every record at a prison with a slot date inside `window`.
    fn records_for_window(
        &self,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<BookingRecord>>;

    /// One prisoner's records at a prison inside `window`.
    fn records_for_prisoner(
        &self,
        prisoner_id: &str,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<BookingRecord>>;
}

/// Prisoner attributes: category, incentive level, housing location.
pub trait PrisonerDirectory {
    /// `NoData` means the prisoner is unknown.
    fn resolve(&self, prisoner_id: &str) -> LookupResult<PrisonerDetails>;
}

/// Non-association links for a prisoner. An empty list and `NoData` mean the
/// same thing here: nobody this prisoner must be kept apart from.
pub trait NonAssociationDirectory {
    fn resolve(&self, prisoner_id: &str) -> LookupResult<Vec<NonAssociation>>;
}

impl<S: TemplateStore + ?Sized> TemplateStore for &S {
    fn prison(&self, code: &str) -> LookupResult<Option<Prison>> {
        (**self).prison(code)
    }

    fn templates_for(
        &self,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<SessionTemplate>> {
        (**self).templates_for(prison_code, window)
    }

    fn templates_in_group(
        &self,
        prison_code: &str,
        capacity_group: &str,
    ) -> LookupResult<Vec<SessionTemplate>> {
        (**self).templates_in_group(prison_code, capacity_group)
    }
}

impl<S: BookingStore + ?Sized> BookingStore for &S {
    fn records_for_window(
        &self,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<BookingRecord>> {
        (**self).records_for_window(prison_code, window)
    }

    fn records_for_prisoner(
        &self,
        prisoner_id: &str,
        prison_code: &str,
        window: &DateRange,
    ) -> LookupResult<Vec<BookingRecord>> {
        (**self).records_for_prisoner(prisoner_id, prison_code, window)
    }
}

impl<S: PrisonerDirectory + ?Sized> PrisonerDirectory for &S {
    fn resolve(&self, prisoner_id: &str) -> LookupResult<PrisonerDetails> {
        (**self).resolve(prisoner_id)
    }
}

impl<S: NonAssociationDirectory + ?Sized> NonAssociationDirectory for &S {
    fn resolve(&self, prisoner_id: &str) -> LookupResult<Vec<NonAssociation>> {
        (**self).resolve(prisoner_id)
    }
}
