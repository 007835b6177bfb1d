//! Shift lifecycle service.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crewshift_core::{CompanyId, EmployeeId, LocationId, ShiftId};
use crewshift_events::{EventJournal, ProblemReported, ShiftEvent, ShiftEventPayload};
use crewshift_orders::summarize_orders;
use crewshift_shifts::{ClosingFields, Shift};
use crewshift_tasks::{ShiftTask, TaskTemplate};

use crate::store::{OrderLedger, ShiftStore, TaskStore};

use super::ServiceError;

/// Input for `ShiftService::start_shift`.
///
/// `now` is the business time of the start; callers supply it so the
/// operation stays deterministic under test.
#[derive(Debug, Clone)]
pub struct StartShift {
    pub employee_id: EmployeeId,
    pub location_id: LocationId,
    pub company_id: Option<CompanyId>,
    pub employee_name: String,
    /// Checklist templates materialized once into this shift's tasks.
    pub templates: Vec<TaskTemplate>,
    pub now: DateTime<Utc>,
}

/// How the caller names the shift to close: directly, or through the
/// employee whose active shift should be resolved.
#[derive(Debug, Clone)]
pub enum CloseTarget {
    Shift(ShiftId),
    Employee {
        employee_id: EmployeeId,
        location_id: Option<LocationId>,
    },
}

/// Drives the shift lifecycle: `start_shift`, `close_shift`, and problem
/// reporting against an open shift.
///
/// The single-active-shift rule is delegated to the store's atomic
/// `insert_active`; this service only adds the friendly pre-check. Journal
/// appends riding on a transition are best-effort (logged, never rolled
/// back into a failure).
#[derive(Debug)]
pub struct ShiftService<R, J> {
    store: R,
    journal: J,
}

impl<R, J> ShiftService<R, J>
where
    R: ShiftStore + OrderLedger + TaskStore,
    J: EventJournal,
{
    pub fn new(store: R, journal: J) -> Self {
        Self { store, journal }
    }

    /// Open a new shift for an employee at a location.
    ///
    /// Fails with `ActiveShiftExists` when the employee already has an
    /// active shift there — both on the pre-check and, under a concurrent
    /// race, from the store's atomic insert.
    pub fn start_shift(&self, cmd: StartShift) -> Result<Shift, ServiceError> {
        if cmd.employee_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "employee_name must not be empty".to_string(),
            ));
        }

        if let Some(existing) = self
            .store
            .find_active(cmd.employee_id, Some(cmd.location_id))?
        {
            debug!(shift_id = %existing.id, "start rejected: active shift present");
            return Err(ServiceError::ActiveShiftExists);
        }

        let shift = Shift::open(
            cmd.employee_id,
            cmd.employee_name,
            cmd.location_id,
            cmd.company_id,
            cmd.now,
        );
        let stored = self.store.insert_active(shift)?;

        if !cmd.templates.is_empty() {
            let tasks: Vec<ShiftTask> = cmd
                .templates
                .iter()
                .map(|t| ShiftTask::from_template(t, stored.id, stored.employee_id))
                .collect();
            if let Err(err) = self.store.insert_tasks(tasks) {
                warn!(shift_id = %stored.id, error = %err, "checklist seeding failed; shift kept");
            }
        }

        self.append_best_effort(&stored, ShiftEventPayload::ShiftStarted {
            started_at: stored.started_at,
        });

        Ok(stored)
    }

    /// Close the active shift named by `target`.
    ///
    /// Explicit cash/card/guests in `fields` take precedence; everything
    /// else is derived from the shift's order slice. Reports the closed
    /// shift back; its `total_revenue()` is the legacy cash + card figure.
    pub fn close_shift(
        &self,
        target: CloseTarget,
        fields: &ClosingFields,
        now: DateTime<Utc>,
    ) -> Result<Shift, ServiceError> {
        let shift = self.resolve_active(target)?.ok_or(ServiceError::NoActiveShift)?;

        let orders = self.store.orders_for_shift(shift.id)?;
        let summary = summarize_orders(&orders);

        let closed = shift.close(now, fields, &summary)?;
        let saved = self.store.update_shift(closed)?;

        self.append_best_effort(&saved, ShiftEventPayload::ShiftClosed {
            closed_at: now,
            total_revenue: saved.total_revenue(),
        });

        Ok(saved)
    }

    /// Journal a problem reported against a shift.
    ///
    /// Unlike the lifecycle transitions, the append IS this operation, so
    /// journal failure surfaces to the caller instead of being swallowed.
    pub fn report_problem(
        &self,
        shift_id: ShiftId,
        report: ProblemReported,
    ) -> Result<(), ServiceError> {
        let shift = self
            .store
            .find_shift(shift_id)?
            .ok_or(ServiceError::ShiftNotFound)?;

        let company_id = shift.company_id.ok_or_else(|| {
            ServiceError::Validation("shift has no company; problem cannot be journaled".to_string())
        })?;

        let created_at = report.reported_at;
        let event = ShiftEvent::new(
            company_id,
            shift.location_id,
            shift.id,
            shift.employee_id,
            created_at,
            ShiftEventPayload::ProblemReported(report),
        );
        self.journal.append(event)?;
        Ok(())
    }

    fn resolve_active(&self, target: CloseTarget) -> Result<Option<Shift>, ServiceError> {
        let shift = match target {
            CloseTarget::Shift(id) => self.store.find_shift(id)?,
            CloseTarget::Employee {
                employee_id,
                location_id,
            } => self.store.find_active(employee_id, location_id)?,
        };
        // The activity rule filters direct lookups too: a shift whose
        // status and end timestamp disagree cannot be closed.
        Ok(shift.filter(Shift::is_active))
    }

    /// Append a lifecycle event, swallowing failure: the journal is an
    /// audit side-channel, and its unavailability must never block an
    /// employee from starting or ending work. Skipped when the shift has
    /// no company to stamp the event with.
    fn append_best_effort(&self, shift: &Shift, payload: ShiftEventPayload) {
        let Some(company_id) = shift.company_id else {
            debug!(shift_id = %shift.id, "no company on shift; journal entry skipped");
            return;
        };

        let event = ShiftEvent::new(
            company_id,
            shift.location_id,
            shift.id,
            shift.employee_id,
            payload_time(&payload),
            payload,
        );
        if let Err(err) = self.journal.append(event) {
            warn!(shift_id = %shift.id, error = %err, "journal append failed; transition kept");
        }
    }
}

fn payload_time(payload: &ShiftEventPayload) -> DateTime<Utc> {
    match payload {
        ShiftEventPayload::ShiftStarted { started_at } => *started_at,
        ShiftEventPayload::ShiftClosed { closed_at, .. } => *closed_at,
        ShiftEventPayload::ProblemReported(report) => report.reported_at,
        ShiftEventPayload::ChecklistTaskCompleted { completed_at, .. } => *completed_at,
        ShiftEventPayload::TaskUncompleted { uncompleted_at, .. } => *uncompleted_at,
        ShiftEventPayload::AnomalyDetected { detected_at, .. } => *detected_at,
    }
}
