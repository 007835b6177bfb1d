//! Typed shift events.
//!
//! The event kind enumeration is **closed**: the wire names below are the
//! stable strings consumers key on, and payload shapes are tagged by kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crewshift_core::{CompanyId, EmployeeId, EventId, LocationId, ShiftId, TaskId};

/// Closed enumeration of shift event kinds.
///
/// `ShiftClosed` and `AnomalyDetected` are consumed by the wider system
/// (reports, anomaly monitoring); the rest are produced by the lifecycle
/// and task operations in this workspace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftEventKind {
    #[serde(rename = "SHIFT_STARTED")]
    ShiftStarted,
    #[serde(rename = "SHIFT_CLOSED")]
    ShiftClosed,
    #[serde(rename = "PROBLEM_REPORTED")]
    ProblemReported,
    #[serde(rename = "CHECKLIST_TASK_COMPLETED")]
    ChecklistTaskCompleted,
    #[serde(rename = "TASK_UNCOMPLETED")]
    TaskUncompleted,
    #[serde(rename = "SHIFT_ANOMALY")]
    AnomalyDetected,
}

impl ShiftEventKind {
    /// Stable wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftEventKind::ShiftStarted => "SHIFT_STARTED",
            ShiftEventKind::ShiftClosed => "SHIFT_CLOSED",
            ShiftEventKind::ProblemReported => "PROBLEM_REPORTED",
            ShiftEventKind::ChecklistTaskCompleted => "CHECKLIST_TASK_COMPLETED",
            ShiftEventKind::TaskUncompleted => "TASK_UNCOMPLETED",
            ShiftEventKind::AnomalyDetected => "SHIFT_ANOMALY",
        }
    }
}

impl core::fmt::Display for ShiftEventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a reported problem.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCategory {
    ProductOut,
    EquipmentFailure,
    WrongOrder,
    RudeClient,
    WorkIssue,
}

impl ProblemCategory {
    /// Default human-readable label for the category.
    pub fn label(&self) -> &'static str {
        match self {
            ProblemCategory::ProductOut => "Product out of stock",
            ProblemCategory::EquipmentFailure => "Equipment failure",
            ProblemCategory::WrongOrder => "Wrong order",
            ProblemCategory::RudeClient => "Rude client",
            ProblemCategory::WorkIssue => "Work issue",
        }
    }
}

/// Severity of a reported problem.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Payload of a `PROBLEM_REPORTED` event.
///
/// `ingredient_id` / `product_id` reference the inventory domain; they are
/// opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemReported {
    pub problem_id: Uuid,
    pub category: ProblemCategory,
    pub category_label: String,
    pub severity: ProblemSeverity,
    pub description: String,
    pub reported_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<Uuid>,
}

/// Type-specific event payload, tagged by the event kind's wire name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShiftEventPayload {
    #[serde(rename = "SHIFT_STARTED")]
    ShiftStarted { started_at: DateTime<Utc> },

    #[serde(rename = "SHIFT_CLOSED")]
    ShiftClosed {
        closed_at: DateTime<Utc>,
        /// Legacy total: cash + card. Online tender is reconciled separately.
        total_revenue: i64,
    },

    #[serde(rename = "PROBLEM_REPORTED")]
    ProblemReported(ProblemReported),

    #[serde(rename = "CHECKLIST_TASK_COMPLETED")]
    ChecklistTaskCompleted {
        task_id: TaskId,
        task_name: String,
        completed_at: DateTime<Utc>,
    },

    #[serde(rename = "TASK_UNCOMPLETED")]
    TaskUncompleted {
        task_id: TaskId,
        task_name: String,
        uncompleted_at: DateTime<Utc>,
    },

    #[serde(rename = "SHIFT_ANOMALY")]
    AnomalyDetected {
        kind: String,
        detail: String,
        detected_at: DateTime<Utc>,
    },
}

impl ShiftEventPayload {
    pub fn kind(&self) -> ShiftEventKind {
        match self {
            ShiftEventPayload::ShiftStarted { .. } => ShiftEventKind::ShiftStarted,
            ShiftEventPayload::ShiftClosed { .. } => ShiftEventKind::ShiftClosed,
            ShiftEventPayload::ProblemReported(_) => ShiftEventKind::ProblemReported,
            ShiftEventPayload::ChecklistTaskCompleted { .. } => {
                ShiftEventKind::ChecklistTaskCompleted
            }
            ShiftEventPayload::TaskUncompleted { .. } => ShiftEventKind::TaskUncompleted,
            ShiftEventPayload::AnomalyDetected { .. } => ShiftEventKind::AnomalyDetected,
        }
    }
}

/// An immutable fact appended to the event journal.
///
/// Scoped to one shift; ordered within a shift by `created_at` (append
/// order breaks ties).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftEvent {
    pub id: EventId,
    pub company_id: CompanyId,
    pub location_id: LocationId,
    pub shift_id: ShiftId,
    pub employee_id: EmployeeId,
    pub created_at: DateTime<Utc>,
    pub payload: ShiftEventPayload,
}

impl ShiftEvent {
    pub fn new(
        company_id: CompanyId,
        location_id: LocationId,
        shift_id: ShiftId,
        employee_id: EmployeeId,
        created_at: DateTime<Utc>,
        payload: ShiftEventPayload,
    ) -> Self {
        Self {
            id: EventId::new(),
            company_id,
            location_id,
            shift_id,
            employee_id,
            created_at,
            payload,
        }
    }

    /// Stable wire name of this event's kind.
    pub fn event_type(&self) -> &'static str {
        self.payload.kind().as_str()
    }
}
