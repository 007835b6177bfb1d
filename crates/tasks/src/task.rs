//! Checklist task entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crewshift_core::{EmployeeId, Entity, ShiftId, TaskId};

/// Template a checklist task is materialized from when a shift starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub title: String,
    pub details: Option<String>,
}

impl TaskTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// One checklist item bound to a shift.
///
/// `completed` and `completed_at` always agree: unset together, set
/// together. `set_completed` is the only mutation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTask {
    pub id: TaskId,
    pub shift_id: ShiftId,
    pub employee_id: EmployeeId,
    pub title: String,
    pub details: Option<String>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Entity for ShiftTask {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl ShiftTask {
    /// Materialize a task from a template for a freshly started shift.
    pub fn from_template(
        template: &TaskTemplate,
        shift_id: ShiftId,
        employee_id: EmployeeId,
    ) -> Self {
        Self {
            id: TaskId::new(),
            shift_id,
            employee_id,
            title: template.title.clone(),
            details: template.details.clone(),
            completed: false,
            completed_at: None,
        }
    }

    /// Toggle completion, keeping `completed` and `completed_at` in step.
    ///
    /// Returns `true` when the task actually changed; toggling to the value
    /// it already holds is a no-op and returns `false`.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) -> bool {
        if self.completed == completed {
            return false;
        }
        self.completed = completed;
        self.completed_at = completed.then_some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> ShiftTask {
        ShiftTask::from_template(
            &TaskTemplate::new("Wipe down the counters"),
            ShiftId::new(),
            EmployeeId::new(),
        )
    }

    #[test]
    fn materialized_task_starts_incomplete() {
        let task = task();
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn completing_stamps_the_timestamp() {
        let mut task = task();
        let now = Utc::now();
        assert!(task.set_completed(true, now));
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));
    }

    #[test]
    fn uncompleting_clears_the_timestamp() {
        let mut task = task();
        task.set_completed(true, Utc::now());
        assert!(task.set_completed(false, Utc::now()));
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn toggling_to_the_held_value_is_a_no_op() {
        let mut task = task();
        let first = Utc::now();
        task.set_completed(true, first);

        let later = first + chrono::Duration::minutes(5);
        assert!(!task.set_completed(true, later));
        // The original completion timestamp is untouched.
        assert_eq!(task.completed_at, Some(first));
    }
}
