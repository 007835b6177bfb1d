//! `crewshift-shifts` — the shift entity and its lifecycle.
//!
//! A shift is one work session for one employee at one location, bounded
//! by start/end. The lifecycle is `Active` → `Closed`, terminal; the
//! single-active-shift rule is enforced at the storage boundary, while the
//! transitions themselves live here as pure functions.

pub mod closing;
pub mod shift;

pub use closing::ClosingFields;
pub use shift::{Shift, ShiftStatus};
