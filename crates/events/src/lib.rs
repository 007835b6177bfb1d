//! `crewshift-events` — shift-scoped domain events and the journal contract.
//!
//! Events are immutable facts: once appended to the journal they are never
//! mutated or deleted. The journal is an audit/notification side-channel,
//! not the source of truth for shift state.

pub mod event;
pub mod journal;

pub use event::{
    ProblemCategory, ProblemReported, ProblemSeverity, ShiftEvent, ShiftEventKind,
    ShiftEventPayload,
};
pub use journal::{EventJournal, JournalError};
