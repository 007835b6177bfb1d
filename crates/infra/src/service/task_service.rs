//! Checklist task tracker service.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crewshift_core::{ShiftId, TaskId};
use crewshift_events::{EventJournal, ShiftEvent, ShiftEventPayload};
use crewshift_tasks::ShiftTask;

use crate::store::{ShiftStore, TaskStore};

use super::ServiceError;

/// Toggles checklist tasks, journaling each effective change.
///
/// Task creation is not part of this service's contract: tasks already
/// exist by the time `toggle_task` is called (they are materialized when
/// the shift starts).
#[derive(Debug)]
pub struct TaskService<R, J> {
    store: R,
    journal: J,
}

impl<R, J> TaskService<R, J>
where
    R: TaskStore + ShiftStore,
    J: EventJournal,
{
    pub fn new(store: R, journal: J) -> Self {
        Self { store, journal }
    }

    /// Set a task's completion state.
    ///
    /// Idempotent: requesting the value the task already holds persists
    /// nothing, journals nothing, and still succeeds. An effective change
    /// flips `completed`/`completed_at` together and appends the matching
    /// journal entry best-effort.
    pub fn toggle_task(
        &self,
        shift_id: ShiftId,
        task_id: TaskId,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<ShiftTask, ServiceError> {
        let mut task = self
            .store
            .find_task(shift_id, task_id)?
            .ok_or(ServiceError::TaskNotFound)?;

        if !task.set_completed(completed, now) {
            debug!(task_id = %task.id, completed, "toggle is a no-op");
            return Ok(task);
        }

        let saved = self.store.save_task(task)?;
        self.journal_toggle(&saved, now);
        Ok(saved)
    }

    /// Journal a completed/uncompleted entry, stamped with the owning
    /// shift's company and location. Best-effort: failure is logged, the
    /// toggle stands.
    fn journal_toggle(&self, task: &ShiftTask, now: DateTime<Utc>) {
        let shift = match self.store.find_shift(task.shift_id) {
            Ok(Some(shift)) => shift,
            Ok(None) => {
                debug!(task_id = %task.id, "owning shift missing; journal entry skipped");
                return;
            }
            Err(err) => {
                warn!(task_id = %task.id, error = %err, "owning shift lookup failed; journal entry skipped");
                return;
            }
        };

        let Some(company_id) = shift.company_id else {
            debug!(task_id = %task.id, "no company on shift; journal entry skipped");
            return;
        };

        let payload = if task.completed {
            ShiftEventPayload::ChecklistTaskCompleted {
                task_id: task.id,
                task_name: task.title.clone(),
                completed_at: now,
            }
        } else {
            ShiftEventPayload::TaskUncompleted {
                task_id: task.id,
                task_name: task.title.clone(),
                uncompleted_at: now,
            }
        };

        let event = ShiftEvent::new(
            company_id,
            shift.location_id,
            shift.id,
            shift.employee_id,
            now,
            payload,
        );
        if let Err(err) = self.journal.append(event) {
            warn!(task_id = %task.id, error = %err, "journal append failed; toggle kept");
        }
    }
}
