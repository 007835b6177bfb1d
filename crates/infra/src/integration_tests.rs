//! Integration tests for the full service → store → journal pipeline.
//!
//! Verifies:
//! - the single-active-shift rule under genuinely concurrent starts
//! - journal unavailability never blocks a lifecycle transition
//! - the full start → toggle → close flow and its journal trail

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Utc;

use crewshift_core::{CompanyId, EmployeeId, LocationId, ShiftId};
use crewshift_events::{EventJournal, JournalError, ShiftEvent, ShiftEventKind};
use crewshift_orders::Order;
use crewshift_shifts::{ClosingFields, ShiftStatus};
use crewshift_tasks::{task_progress, TaskTemplate};

use crate::service::{CloseTarget, ServiceError, ShiftService, StartShift, TaskService};
use crate::store::{InMemoryEventJournal, InMemoryStore, TaskStore};

fn start_cmd(employee_id: EmployeeId, location_id: LocationId) -> StartShift {
    StartShift {
        employee_id,
        location_id,
        company_id: Some(CompanyId::new()),
        employee_name: "Robin".to_string(),
        templates: Vec::new(),
        now: Utc::now(),
    }
}

/// A journal whose backing store is down.
struct UnavailableJournal;

impl EventJournal for UnavailableJournal {
    fn append(&self, _event: ShiftEvent) -> Result<(), JournalError> {
        Err(JournalError::Unavailable("connection refused".to_string()))
    }

    fn read_for_shift(&self, _shift_id: ShiftId) -> Result<Vec<ShiftEvent>, JournalError> {
        Err(JournalError::Unavailable("connection refused".to_string()))
    }
}

#[test]
fn concurrent_starts_admit_exactly_one_active_shift() {
    const STARTERS: usize = 8;

    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(ShiftService::new(
        store.clone(),
        Arc::new(InMemoryEventJournal::new()),
    ));

    let employee_id = EmployeeId::new();
    let location_id = LocationId::new();
    let barrier = Arc::new(Barrier::new(STARTERS));

    let handles: Vec<_> = (0..STARTERS)
        .map(|_| {
            let service = service.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                service.start_shift(start_cmd(employee_id, location_id))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let conflicted = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::ActiveShiftExists)))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(conflicted, STARTERS - 1);

    let active: Vec<_> = store
        .shifts()
        .into_iter()
        .filter(|s| s.is_active() && s.employee_id == employee_id && s.location_id == location_id)
        .collect();
    assert_eq!(active.len(), 1);
}

#[test]
fn journal_outage_never_blocks_start_close_or_toggle() {
    let store = Arc::new(InMemoryStore::new());
    let service = ShiftService::new(store.clone(), UnavailableJournal);
    let tasks = TaskService::new(store.clone(), UnavailableJournal);

    let employee_id = EmployeeId::new();
    let location_id = LocationId::new();

    let mut cmd = start_cmd(employee_id, location_id);
    cmd.templates = vec![TaskTemplate::new("Sweep the floor")];
    let shift = service.start_shift(cmd).unwrap();
    assert!(shift.is_active());

    let checklist = store.tasks_for_shift(shift.id).unwrap();
    let toggled = tasks
        .toggle_task(shift.id, checklist[0].id, true, Utc::now())
        .unwrap();
    assert!(toggled.completed);

    let closed = service
        .close_shift(
            CloseTarget::Employee {
                employee_id,
                location_id: Some(location_id),
            },
            &ClosingFields::default(),
            Utc::now(),
        )
        .unwrap();
    assert_eq!(closed.status, ShiftStatus::Closed);
}

#[test]
fn problem_reports_surface_journal_outages() {
    let store = Arc::new(InMemoryStore::new());
    let service = ShiftService::new(store.clone(), UnavailableJournal);

    let shift = service
        .start_shift(start_cmd(EmployeeId::new(), LocationId::new()))
        .unwrap();

    let category = crewshift_events::ProblemCategory::ProductOut;
    let err = service
        .report_problem(
            shift.id,
            crewshift_events::ProblemReported {
                problem_id: uuid::Uuid::now_v7(),
                category,
                category_label: category.label().to_string(),
                severity: crewshift_events::ProblemSeverity::Medium,
                description: "Out of oat milk".to_string(),
                reported_at: Utc::now(),
                ingredient_id: Some(uuid::Uuid::now_v7()),
                product_id: None,
            },
        )
        .unwrap_err();

    assert_eq!(err.code(), "journal_unavailable");
}

#[test]
fn full_shift_day_flow() {
    let store = Arc::new(InMemoryStore::new());
    let journal = Arc::new(InMemoryEventJournal::new());
    let shifts = ShiftService::new(store.clone(), journal.clone());
    let tasks = TaskService::new(store.clone(), journal.clone());

    let employee_id = EmployeeId::new();
    let location_id = LocationId::new();

    let mut cmd = start_cmd(employee_id, location_id);
    cmd.templates = vec![
        TaskTemplate::new("Count the till"),
        TaskTemplate::new("Wipe the machines"),
        TaskTemplate::new("Check deliveries"),
    ];
    let shift = shifts.start_shift(cmd).unwrap();

    // Two of three checklist items get done.
    let checklist = store.tasks_for_shift(shift.id).unwrap();
    tasks
        .toggle_task(shift.id, checklist[0].id, true, Utc::now())
        .unwrap();
    tasks
        .toggle_task(shift.id, checklist[1].id, true, Utc::now())
        .unwrap();

    let progress = task_progress(&store.tasks_for_shift(shift.id).unwrap());
    assert_eq!(progress.total, 3);
    assert_eq!(progress.completed, 2);
    assert_eq!(progress.percent, 67);

    // The register takes a few orders.
    for (tender, amount, guests) in [
        (crewshift_core::TenderType::Cash, 1_200, 2),
        (crewshift_core::TenderType::Card, 2_600, 3),
        (crewshift_core::TenderType::Online, 900, 1),
    ] {
        store.record_order(Order {
            id: crewshift_core::OrderId::new(),
            shift_id: shift.id,
            employee_id,
            tender,
            amount,
            guest_count: guests,
            created_at: Utc::now(),
        });
    }

    let closed = shifts
        .close_shift(
            CloseTarget::Employee {
                employee_id,
                location_id: Some(location_id),
            },
            &ClosingFields::default(),
            Utc::now(),
        )
        .unwrap();

    assert_eq!(closed.revenue_cash, 1_200);
    assert_eq!(closed.revenue_card, 2_600);
    assert_eq!(closed.revenue_online, 900);
    assert_eq!(closed.check_count, 3);
    assert_eq!(closed.total_revenue(), 3_800);

    let trail: Vec<ShiftEventKind> = journal
        .read_for_shift(shift.id)
        .unwrap()
        .iter()
        .map(|e| e.payload.kind())
        .collect();
    assert_eq!(
        trail,
        vec![
            ShiftEventKind::ShiftStarted,
            ShiftEventKind::ChecklistTaskCompleted,
            ShiftEventKind::ChecklistTaskCompleted,
            ShiftEventKind::ShiftClosed,
        ]
    );
}

#[test]
fn shift_numbers_count_up_per_location() {
    let store = Arc::new(InMemoryStore::new());
    let service = ShiftService::new(store.clone(), Arc::new(InMemoryEventJournal::new()));

    let employee_id = EmployeeId::new();
    let location_a = LocationId::new();
    let location_b = LocationId::new();

    let first = service.start_shift(start_cmd(employee_id, location_a)).unwrap();
    assert_eq!(first.number, 1);
    service
        .close_shift(
            CloseTarget::Shift(first.id),
            &ClosingFields::default(),
            Utc::now(),
        )
        .unwrap();

    let second = service.start_shift(start_cmd(employee_id, location_a)).unwrap();
    assert_eq!(second.number, 2);

    // Numbering is scoped per location.
    let elsewhere = service
        .start_shift(start_cmd(EmployeeId::new(), location_b))
        .unwrap();
    assert_eq!(elsewhere.number, 1);
}

#[test]
fn a_closed_shift_frees_the_slot_for_a_retry() {
    let service = ShiftService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(InMemoryEventJournal::new()),
    );

    let employee_id = EmployeeId::new();
    let location_id = LocationId::new();

    let first = service.start_shift(start_cmd(employee_id, location_id)).unwrap();
    service
        .close_shift(
            CloseTarget::Shift(first.id),
            &ClosingFields::default(),
            Utc::now(),
        )
        .unwrap();

    // Retrying from scratch after a close is always safe.
    let again = service.start_shift(start_cmd(employee_id, location_id)).unwrap();
    assert_ne!(again.id, first.id);
    assert!(again.is_active());
}
