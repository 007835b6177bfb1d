//! Store traits consumed by the services.

use std::sync::Arc;

use thiserror::Error;

use crewshift_core::{EmployeeId, LocationId, ShiftId, TaskId};
use crewshift_orders::Order;
use crewshift_shifts::Shift;
use crewshift_tasks::ShiftTask;

/// Store operation error.
///
/// These are **infrastructure** failures, kept apart from the domain
/// taxonomy. `ActiveShiftExists` is the one business-meaningful variant:
/// it is how a backend surfaces the atomic single-active-shift check.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An active shift already exists for the (employee, location) pair.
    ///
    /// Backends must raise this from `insert_active` atomically with the
    /// insert attempt; the services never re-check after the fact.
    #[error("an active shift already exists for this employee and location")]
    ActiveShiftExists,

    /// The record to update does not exist.
    #[error("record not found")]
    NotFound,

    /// The backend cannot be reached or refused the operation. Transient;
    /// safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Shift persistence.
///
/// Reads apply the fail-safe activity rule: a record whose `status` and
/// `ended_at` disagree is never returned as active.
pub trait ShiftStore: Send + Sync {
    /// Insert a freshly opened shift, enforcing the single-active-shift
    /// rule for its (employee, location) pair atomically with the insert.
    ///
    /// Assigns the per-location `number` (starting at 1) and returns the
    /// stored shift carrying it.
    fn insert_active(&self, shift: Shift) -> Result<Shift, StoreError>;

    /// The active shift for an employee, optionally narrowed to one
    /// location.
    fn find_active(
        &self,
        employee_id: EmployeeId,
        location_id: Option<LocationId>,
    ) -> Result<Option<Shift>, StoreError>;

    fn find_shift(&self, id: ShiftId) -> Result<Option<Shift>, StoreError>;

    /// Persist a mutated shift (the close transition). The record must
    /// already exist.
    fn update_shift(&self, shift: Shift) -> Result<Shift, StoreError>;
}

/// Read-only view of the point-of-sale order ledger.
pub trait OrderLedger: Send + Sync {
    fn orders_for_shift(&self, shift_id: ShiftId) -> Result<Vec<Order>, StoreError>;
}

/// Checklist task persistence.
pub trait TaskStore: Send + Sync {
    /// Materialize a batch of tasks for a freshly started shift.
    fn insert_tasks(&self, tasks: Vec<ShiftTask>) -> Result<(), StoreError>;

    fn tasks_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftTask>, StoreError>;

    fn find_task(&self, shift_id: ShiftId, task_id: TaskId) -> Result<Option<ShiftTask>, StoreError>;

    /// Persist a toggled task. The record must already exist.
    fn save_task(&self, task: ShiftTask) -> Result<ShiftTask, StoreError>;
}

impl<S> ShiftStore for Arc<S>
where
    S: ShiftStore + ?Sized,
{
    fn insert_active(&self, shift: Shift) -> Result<Shift, StoreError> {
        (**self).insert_active(shift)
    }

    fn find_active(
        &self,
        employee_id: EmployeeId,
        location_id: Option<LocationId>,
    ) -> Result<Option<Shift>, StoreError> {
        (**self).find_active(employee_id, location_id)
    }

    fn find_shift(&self, id: ShiftId) -> Result<Option<Shift>, StoreError> {
        (**self).find_shift(id)
    }

    fn update_shift(&self, shift: Shift) -> Result<Shift, StoreError> {
        (**self).update_shift(shift)
    }
}

impl<L> OrderLedger for Arc<L>
where
    L: OrderLedger + ?Sized,
{
    fn orders_for_shift(&self, shift_id: ShiftId) -> Result<Vec<Order>, StoreError> {
        (**self).orders_for_shift(shift_id)
    }
}

impl<T> TaskStore for Arc<T>
where
    T: TaskStore + ?Sized,
{
    fn insert_tasks(&self, tasks: Vec<ShiftTask>) -> Result<(), StoreError> {
        (**self).insert_tasks(tasks)
    }

    fn tasks_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftTask>, StoreError> {
        (**self).tasks_for_shift(shift_id)
    }

    fn find_task(&self, shift_id: ShiftId, task_id: TaskId) -> Result<Option<ShiftTask>, StoreError> {
        (**self).find_task(shift_id, task_id)
    }

    fn save_task(&self, task: ShiftTask) -> Result<ShiftTask, StoreError> {
        (**self).save_task(task)
    }
}
