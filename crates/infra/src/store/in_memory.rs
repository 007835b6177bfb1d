//! In-memory backends.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::HashMap;
use std::sync::RwLock;

use crewshift_core::{EmployeeId, LocationId, ShiftId, TaskId};
use crewshift_events::{EventJournal, JournalError, ShiftEvent};
use crewshift_orders::Order;
use crewshift_shifts::Shift;
use crewshift_tasks::ShiftTask;

use super::r#trait::{OrderLedger, ShiftStore, StoreError, TaskStore};

/// In-memory repository: shifts, tasks, and the order ledger in one place.
///
/// `insert_active` runs its existence check and insert under a single write
/// lock, which is what makes the single-active-shift rule hold under
/// concurrent starts.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    shifts: RwLock<HashMap<ShiftId, Shift>>,
    orders: RwLock<Vec<Order>>,
    tasks: RwLock<HashMap<TaskId, ShiftTask>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an order, standing in for the external point-of-sale ledger.
    pub fn record_order(&self, order: Order) {
        self.orders.write().expect("order ledger lock poisoned").push(order);
    }

    /// Snapshot of every stored shift (test/dev introspection).
    pub fn shifts(&self) -> Vec<Shift> {
        self.shifts
            .read()
            .expect("shift table lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn next_number(shifts: &HashMap<ShiftId, Shift>, location_id: LocationId) -> u64 {
        shifts
            .values()
            .filter(|s| s.location_id == location_id)
            .map(|s| s.number)
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl ShiftStore for InMemoryStore {
    fn insert_active(&self, mut shift: Shift) -> Result<Shift, StoreError> {
        let mut shifts = self
            .shifts
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        // Check and insert under the same write lock: this is the atomic
        // insert-if-no-active-exists the services rely on.
        let already_active = shifts.values().any(|s| {
            s.is_active()
                && s.employee_id == shift.employee_id
                && s.location_id == shift.location_id
        });
        if already_active {
            return Err(StoreError::ActiveShiftExists);
        }

        shift.number = Self::next_number(&shifts, shift.location_id);
        shifts.insert(shift.id, shift.clone());
        Ok(shift)
    }

    fn find_active(
        &self,
        employee_id: EmployeeId,
        location_id: Option<LocationId>,
    ) -> Result<Option<Shift>, StoreError> {
        let shifts = self
            .shifts
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(shifts
            .values()
            .filter(|s| s.is_active() && s.employee_id == employee_id)
            .find(|s| location_id.is_none_or(|l| s.location_id == l))
            .cloned())
    }

    fn find_shift(&self, id: ShiftId) -> Result<Option<Shift>, StoreError> {
        let shifts = self
            .shifts
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(shifts.get(&id).cloned())
    }

    fn update_shift(&self, shift: Shift) -> Result<Shift, StoreError> {
        let mut shifts = self
            .shifts
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !shifts.contains_key(&shift.id) {
            return Err(StoreError::NotFound);
        }
        shifts.insert(shift.id, shift.clone());
        Ok(shift)
    }
}

impl OrderLedger for InMemoryStore {
    fn orders_for_shift(&self, shift_id: ShiftId) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(orders
            .iter()
            .filter(|o| o.shift_id == shift_id)
            .cloned()
            .collect())
    }
}

impl TaskStore for InMemoryStore {
    fn insert_tasks(&self, new_tasks: Vec<ShiftTask>) -> Result<(), StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        for task in new_tasks {
            tasks.insert(task.id, task);
        }
        Ok(())
    }

    fn tasks_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftTask>, StoreError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(tasks
            .values()
            .filter(|t| t.shift_id == shift_id)
            .cloned()
            .collect())
    }

    fn find_task(&self, shift_id: ShiftId, task_id: TaskId) -> Result<Option<ShiftTask>, StoreError> {
        let tasks = self
            .tasks
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        Ok(tasks
            .get(&task_id)
            .filter(|t| t.shift_id == shift_id)
            .cloned())
    }

    fn save_task(&self, task: ShiftTask) -> Result<ShiftTask, StoreError> {
        let mut tasks = self
            .tasks
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        if !tasks.contains_key(&task.id) {
            return Err(StoreError::NotFound);
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }
}

/// In-memory append-only journal.
///
/// Each append is atomic under the write lock; reads clone a snapshot, so
/// they observe a consistent prefix while appends continue.
#[derive(Debug, Default)]
pub struct InMemoryEventJournal {
    events: RwLock<Vec<ShiftEvent>>,
}

impl InMemoryEventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events appended so far (test/dev introspection).
    pub fn len(&self) -> usize {
        self.events.read().expect("journal lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventJournal for InMemoryEventJournal {
    fn append(&self, event: ShiftEvent) -> Result<(), JournalError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| JournalError::Unavailable("lock poisoned".to_string()))?;
        events.push(event);
        Ok(())
    }

    fn read_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftEvent>, JournalError> {
        let events = self
            .events
            .read()
            .map_err(|_| JournalError::Unavailable("lock poisoned".to_string()))?;

        let mut for_shift: Vec<ShiftEvent> = events
            .iter()
            .filter(|e| e.shift_id == shift_id)
            .cloned()
            .collect();
        // Append order already breaks ties; the sort is stable.
        for_shift.sort_by_key(|e| e.created_at);
        Ok(for_shift)
    }
}
