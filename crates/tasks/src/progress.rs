//! Completion fold over a shift's checklist.

use serde::{Deserialize, Serialize};

use crate::task::ShiftTask;

/// Checklist completion figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub total: u32,
    pub completed: u32,
    /// Rounded to the nearest integer percent.
    pub percent: u8,
}

/// Fold a shift's tasks into completion figures.
///
/// An empty checklist is vacuously complete (100%), so a shift with no
/// checklist is never flagged as incomplete.
pub fn task_progress(tasks: &[ShiftTask]) -> TaskProgress {
    let total = tasks.len() as u32;
    let completed = tasks.iter().filter(|t| t.completed).count() as u32;

    let percent = if total == 0 {
        100
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u8
    };

    TaskProgress {
        total,
        completed,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskTemplate;
    use chrono::Utc;
    use crewshift_core::{EmployeeId, ShiftId};

    fn tasks(total: usize, completed: usize) -> Vec<ShiftTask> {
        let shift_id = ShiftId::new();
        let employee_id = EmployeeId::new();
        (0..total)
            .map(|i| {
                let mut task = ShiftTask::from_template(
                    &TaskTemplate::new(format!("task {i}")),
                    shift_id,
                    employee_id,
                );
                if i < completed {
                    task.set_completed(true, Utc::now());
                }
                task
            })
            .collect()
    }

    #[test]
    fn empty_checklist_is_vacuously_complete() {
        let progress = task_progress(&[]);
        assert_eq!(progress.total, 0);
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.percent, 100);
    }

    #[test]
    fn percent_rounds_to_the_nearest_integer() {
        // 1/3 -> 33, 2/3 -> 67.
        assert_eq!(task_progress(&tasks(3, 1)).percent, 33);
        assert_eq!(task_progress(&tasks(3, 2)).percent, 67);
    }

    #[test]
    fn fully_completed_checklist_is_one_hundred_percent() {
        let progress = task_progress(&tasks(4, 4));
        assert_eq!(progress.total, 4);
        assert_eq!(progress.completed, 4);
        assert_eq!(progress.percent, 100);
    }
}
