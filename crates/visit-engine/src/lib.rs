//! # visit-engine
//!
//! Scheduling core for prison social visits. Turns recurring session
//! templates into concrete bookable occurrences, filters them to what a
//! given prisoner may actually use, and accounts for capacity and conflicts
//! against existing bookings — a pure, read-only computation over data held
//! by external collaborators.
//!
//! ## Modules
//!
//! - [`expander`] — session template → concrete occurrences in a date window
//! - [`location`] — hierarchical location paths and prefix matching
//! - [`eligibility`] — per-occurrence accept/reject for a prisoner
//! - [`capacity`] — capacity pools and seat counting
//! - [`conflict`] — double-booking and non-association detection
//! - [`availability`] — the orchestrating [`SessionService`] queries
//! - [`template`], [`booking`] — the domain types
//! - [`store`] — collaborator seams; [`memory`] — in-memory backing for
//!   fixtures and the CLI
//! - [`error`] — error types

pub mod availability;
pub mod booking;
pub mod capacity;
pub mod conflict;
pub mod eligibility;
pub mod error;
pub mod expander;
pub mod location;
pub mod memory;
pub mod store;
pub mod template;

pub use availability::{SessionService, SessionsRequest, VisitSession};
pub use booking::Restriction;
pub use capacity::SessionCapacity;
pub use conflict::ConflictKind;
pub use error::{Result, VisitError};
pub use expander::{expand, SessionOccurrence};
pub use memory::{MemoryStore, Scenario};
pub use template::{ClientType, DateRange};
