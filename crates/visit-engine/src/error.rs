//! Error types for visit-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisitError {
    /// The caller supplied a malformed or impermissible request.
    /// Never retried — the request itself is wrong.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A referenced entity (prison, prisoner, session slot) does not exist.
    #[error("{entity} not found: {reference}")]
    NotFound {
        entity: &'static str,
        reference: String,
    },

    /// The prisoner exists but is held at a different prison than the one
    /// named in the request. Surfaced distinctly from `NotFound` so callers
    /// can produce a precise message.
    #[error("prisoner {prisoner_id} is registered at {actual_prison}, not {requested_prison}")]
    PrisonMismatch {
        prisoner_id: String,
        requested_prison: String,
        actual_prison: String,
    },

    /// A collaborator lookup failed for a reason other than "no data".
    /// Retryable by the calling layer; this engine only propagates.
    #[error("upstream lookup failed ({context}): {message}")]
    Upstream { context: String, message: String },

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Recurrence rule construction or expansion failed for a template.
    #[error("expansion failed for template {reference}: {message}")]
    Expansion { reference: String, message: String },
}

pub type Result<T> = std::result::Result<T, VisitError>;
