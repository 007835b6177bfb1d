//! `crewshift-tasks` — checklist tasks bound to a shift.
//!
//! Tasks are materialized once when a shift starts and toggled by the task
//! tracker afterwards; they are independent of the financial aggregation.

pub mod progress;
pub mod task;

pub use progress::{task_progress, TaskProgress};
pub use task::{ShiftTask, TaskTemplate};
