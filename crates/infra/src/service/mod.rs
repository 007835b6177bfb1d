//! Application services.
//!
//! The services orchestrate the shift lifecycle against the store and the
//! journal: resolve state, run the pure transition, persist, then append
//! the matching journal entry. Journal appends riding on a transition are
//! best-effort — logged and discarded on failure, never rolling the
//! transition back.

pub mod shift_service;
pub mod task_service;

pub use shift_service::{CloseTarget, ShiftService, StartShift};
pub use task_service::TaskService;

use thiserror::Error;

use crewshift_core::DomainError;
use crewshift_events::JournalError;

use crate::store::StoreError;

/// Service-level error, folding domain and infrastructure failures into
/// the stable codes callers key on.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The employee already has an active shift at this location.
    /// Expected, user-facing; do not retry.
    #[error("an active shift already exists for this employee and location")]
    ActiveShiftExists,

    /// Nothing to close. Expected, user-facing; do not retry.
    #[error("no active shift found")]
    NoActiveShift,

    /// The referenced shift does not exist.
    #[error("shift not found")]
    ShiftNotFound,

    /// The referenced task does not exist under the given shift.
    #[error("task not found")]
    TaskNotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The store failed. Transient; caller may retry with backoff.
    #[error(transparent)]
    Store(StoreError),

    /// The journal failed on an operation where the append IS the
    /// operation (problem reports). Transient; caller may retry.
    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl ServiceError {
    /// Stable error code for the boundary layer to key on.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::ActiveShiftExists => "active_shift_exists",
            ServiceError::NoActiveShift => "no_active_shift",
            ServiceError::ShiftNotFound => "shift_not_found",
            ServiceError::TaskNotFound => "task_not_found",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Invariant(_) => "invariant_violation",
            ServiceError::Store(_) => "store_unavailable",
            ServiceError::Journal(_) => "journal_unavailable",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::ActiveShiftExists => ServiceError::ActiveShiftExists,
            other => ServiceError::Store(other),
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ServiceError::Validation(msg)
            }
            DomainError::InvariantViolation(msg) => ServiceError::Invariant(msg),
            DomainError::Conflict(_) => ServiceError::ActiveShiftExists,
            DomainError::NotFound => ServiceError::ShiftNotFound,
        }
    }
}
