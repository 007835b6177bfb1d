//! Event journal contract.
//!
//! Append-only, shift-scoped. Appends must be atomic and individually
//! durable once acknowledged; reads observe a consistent (possibly stale)
//! prefix and are safe concurrently with appends.

use std::sync::Arc;

use thiserror::Error;

use crewshift_core::ShiftId;

use crate::event::ShiftEvent;

/// Journal operation error.
///
/// These are **infrastructure** failures. Callers riding a journal append
/// on a state transition are expected to log-and-discard `Unavailable`
/// rather than roll the transition back.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The backing store cannot be reached or refused the write. Transient;
    /// safe to retry.
    #[error("journal unavailable: {0}")]
    Unavailable(String),

    /// The event could not be encoded for storage.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}

/// Append-only journal of shift events.
///
/// Implementations must never mutate or delete an acknowledged event, and
/// must return a shift's events in non-decreasing `created_at` order with
/// append order breaking ties.
pub trait EventJournal: Send + Sync {
    /// Append a single event. Atomic: the event is either fully durable or
    /// not written at all.
    fn append(&self, event: ShiftEvent) -> Result<(), JournalError>;

    /// All events for a shift, in creation order.
    fn read_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftEvent>, JournalError>;
}

impl<J> EventJournal for Arc<J>
where
    J: EventJournal + ?Sized,
{
    fn append(&self, event: ShiftEvent) -> Result<(), JournalError> {
        (**self).append(event)
    }

    fn read_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftEvent>, JournalError> {
        (**self).read_for_shift(shift_id)
    }
}
