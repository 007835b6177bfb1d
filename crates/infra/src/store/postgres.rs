//! Postgres-backed store and journal.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE shifts (
//!     id              UUID PRIMARY KEY,
//!     employee_id     UUID NOT NULL,
//!     employee_name   TEXT NOT NULL,
//!     location_id     UUID NOT NULL,
//!     company_id      UUID,
//!     number          BIGINT NOT NULL,
//!     status          TEXT NOT NULL,
//!     started_at      TIMESTAMPTZ NOT NULL,
//!     ended_at        TIMESTAMPTZ,
//!     revenue_cash    BIGINT NOT NULL,
//!     revenue_card    BIGINT NOT NULL,
//!     revenue_online  BIGINT NOT NULL,
//!     check_count     INT NOT NULL,
//!     guest_count     INT NOT NULL,
//!     note            TEXT,
//!     closing_answers JSONB NOT NULL DEFAULT '{}'
//! );
//!
//! -- The single-active-shift rule, enforced at the database level.
//! CREATE UNIQUE INDEX shifts_one_active_per_pair
//!     ON shifts (employee_id, location_id) WHERE status = 'active';
//!
//! CREATE TABLE shift_tasks (
//!     id           UUID PRIMARY KEY,
//!     shift_id     UUID NOT NULL REFERENCES shifts (id),
//!     employee_id  UUID NOT NULL,
//!     title        TEXT NOT NULL,
//!     details      TEXT,
//!     completed    BOOLEAN NOT NULL,
//!     completed_at TIMESTAMPTZ
//! );
//!
//! CREATE TABLE orders (
//!     id          UUID PRIMARY KEY,
//!     shift_id    UUID NOT NULL,
//!     employee_id UUID NOT NULL,
//!     tender      TEXT NOT NULL,
//!     amount      BIGINT NOT NULL,
//!     guest_count INT NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE shift_events (
//!     id          UUID PRIMARY KEY,
//!     company_id  UUID NOT NULL,
//!     location_id UUID NOT NULL,
//!     shift_id    UUID NOT NULL,
//!     employee_id UUID NOT NULL,
//!     event_type  TEXT NOT NULL,
//!     created_at  TIMESTAMPTZ NOT NULL,
//!     payload     JSONB NOT NULL
//! );
//! ```
//!
//! ## Error mapping
//!
//! | SQLx error | PG code | StoreError | Scenario |
//! |------------|---------|------------|----------|
//! | Database (unique violation on `shifts_one_active_per_pair`) | `23505` | `ActiveShiftExists` | Concurrent start for the same (employee, location) |
//! | Database (other unique violation) | `23505` | `InvalidRecord` | Duplicate primary key (caller bug) |
//! | Database (other) | any | `Unavailable` | Constraint/IO failure |
//! | PoolClosed / Io / Tls | n/a | `Unavailable` | Connection trouble; safe to retry |
//!
//! ## Thread safety
//!
//! Both types wrap a SQLx pool and are `Send + Sync`. The store traits are
//! synchronous; operations bridge into the ambient tokio runtime via
//! `Handle::try_current().block_on`, so they must be called from within a
//! tokio runtime context.

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, PgPool, Row};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crewshift_core::{EmployeeId, LocationId, ShiftId, TaskId, TenderType};
use crewshift_events::{EventJournal, JournalError, ShiftEvent, ShiftEventPayload};
use crewshift_orders::Order;
use crewshift_shifts::{Shift, ShiftStatus};
use crewshift_tasks::ShiftTask;

use super::r#trait::{OrderLedger, ShiftStore, StoreError, TaskStore};

const ACTIVE_SHIFT_INDEX: &str = "shifts_one_active_per_pair";

/// Postgres-backed repository for shifts, tasks, and the order ledger.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self, shift), fields(shift_id = %shift.id, location_id = %shift.location_id))]
    async fn insert_active_inner(&self, shift: Shift) -> Result<Shift, StoreError> {
        // `number` is assigned here, scoped per location; the partial unique
        // index turns a concurrent second active insert into a 23505.
        let row = sqlx::query(
            r#"
            INSERT INTO shifts (
                id, employee_id, employee_name, location_id, company_id,
                number, status, started_at, ended_at,
                revenue_cash, revenue_card, revenue_online,
                check_count, guest_count, note, closing_answers
            )
            VALUES (
                $1, $2, $3, $4, $5,
                (SELECT COALESCE(MAX(number), 0) + 1 FROM shifts WHERE location_id = $4),
                $6, $7, NULL,
                0, 0, 0,
                0, 0, NULL, '{}'::jsonb
            )
            RETURNING number
            "#,
        )
        .bind(shift.id.as_uuid())
        .bind(shift.employee_id.as_uuid())
        .bind(&shift.employee_name)
        .bind(shift.location_id.as_uuid())
        .bind(shift.company_id.map(|c| *c.as_uuid()))
        .bind(encode_status(shift.status))
        .bind(shift.started_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_active", e))?;

        let number: i64 = row
            .try_get("number")
            .map_err(|e| StoreError::InvalidRecord(format!("failed to read number: {e}")))?;

        let mut stored = shift;
        stored.number = number as u64;
        Ok(stored)
    }

    #[instrument(skip(self), fields(employee_id = %employee_id))]
    async fn find_active_inner(
        &self,
        employee_id: EmployeeId,
        location_id: Option<LocationId>,
    ) -> Result<Option<Shift>, StoreError> {
        // Both halves of the activity rule are in the predicate: a record
        // whose status and end timestamp disagree is never returned.
        let row = sqlx::query(
            r#"
            SELECT * FROM shifts
            WHERE employee_id = $1
              AND ($2::uuid IS NULL OR location_id = $2)
              AND status = 'active'
              AND ended_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(employee_id.as_uuid())
        .bind(location_id.map(|l| *l.as_uuid()))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_active", e))?;

        row.map(decode_shift_row).transpose()
    }

    #[instrument(skip(self), fields(shift_id = %id))]
    async fn get_inner(&self, id: ShiftId) -> Result<Option<Shift>, StoreError> {
        let row = sqlx::query("SELECT * FROM shifts WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_shift", e))?;

        row.map(decode_shift_row).transpose()
    }

    #[instrument(skip(self, shift), fields(shift_id = %shift.id))]
    async fn update_inner(&self, shift: Shift) -> Result<Shift, StoreError> {
        let answers = serde_json::to_value(&shift.closing_answers)
            .map_err(|e| StoreError::InvalidRecord(format!("closing answers encoding: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                status = $2, ended_at = $3,
                revenue_cash = $4, revenue_card = $5, revenue_online = $6,
                check_count = $7, guest_count = $8,
                note = $9, closing_answers = $10
            WHERE id = $1
            "#,
        )
        .bind(shift.id.as_uuid())
        .bind(encode_status(shift.status))
        .bind(shift.ended_at)
        .bind(shift.revenue_cash)
        .bind(shift.revenue_card)
        .bind(shift.revenue_online)
        .bind(shift.check_count as i32)
        .bind(shift.guest_count as i32)
        .bind(shift.note.as_deref())
        .bind(answers)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_shift", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(shift)
    }

    async fn orders_for_shift_inner(&self, shift_id: ShiftId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE shift_id = $1 ORDER BY created_at ASC",
        )
        .bind(shift_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_shift", e))?;

        rows.into_iter().map(decode_order_row).collect()
    }

    async fn insert_tasks_inner(&self, tasks: Vec<ShiftTask>) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_tasks", e))?;

        for task in &tasks {
            sqlx::query(
                r#"
                INSERT INTO shift_tasks (id, shift_id, employee_id, title, details, completed, completed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(task.id.as_uuid())
            .bind(task.shift_id.as_uuid())
            .bind(task.employee_id.as_uuid())
            .bind(&task.title)
            .bind(task.details.as_deref())
            .bind(task.completed)
            .bind(task.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_tasks", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_tasks", e))
    }

    async fn tasks_for_shift_inner(&self, shift_id: ShiftId) -> Result<Vec<ShiftTask>, StoreError> {
        let rows = sqlx::query("SELECT * FROM shift_tasks WHERE shift_id = $1 ORDER BY id ASC")
            .bind(shift_id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("tasks_for_shift", e))?;

        rows.into_iter().map(decode_task_row).collect()
    }

    async fn get_task_inner(
        &self,
        shift_id: ShiftId,
        task_id: TaskId,
    ) -> Result<Option<ShiftTask>, StoreError> {
        let row = sqlx::query("SELECT * FROM shift_tasks WHERE id = $1 AND shift_id = $2")
            .bind(task_id.as_uuid())
            .bind(shift_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_task", e))?;

        row.map(decode_task_row).transpose()
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn save_task_inner(&self, task: ShiftTask) -> Result<ShiftTask, StoreError> {
        let result = sqlx::query(
            "UPDATE shift_tasks SET completed = $2, completed_at = $3 WHERE id = $1",
        )
        .bind(task.id.as_uuid())
        .bind(task.completed)
        .bind(task.completed_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_task", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(task)
    }
}

impl ShiftStore for PostgresStore {
    fn insert_active(&self, shift: Shift) -> Result<Shift, StoreError> {
        block_on_runtime(self.insert_active_inner(shift))
    }

    fn find_active(
        &self,
        employee_id: EmployeeId,
        location_id: Option<LocationId>,
    ) -> Result<Option<Shift>, StoreError> {
        block_on_runtime(self.find_active_inner(employee_id, location_id))
    }

    fn find_shift(&self, id: ShiftId) -> Result<Option<Shift>, StoreError> {
        block_on_runtime(self.get_inner(id))
    }

    fn update_shift(&self, shift: Shift) -> Result<Shift, StoreError> {
        block_on_runtime(self.update_inner(shift))
    }
}

impl OrderLedger for PostgresStore {
    fn orders_for_shift(&self, shift_id: ShiftId) -> Result<Vec<Order>, StoreError> {
        block_on_runtime(self.orders_for_shift_inner(shift_id))
    }
}

impl TaskStore for PostgresStore {
    fn insert_tasks(&self, tasks: Vec<ShiftTask>) -> Result<(), StoreError> {
        block_on_runtime(self.insert_tasks_inner(tasks))
    }

    fn tasks_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftTask>, StoreError> {
        block_on_runtime(self.tasks_for_shift_inner(shift_id))
    }

    fn find_task(&self, shift_id: ShiftId, task_id: TaskId) -> Result<Option<ShiftTask>, StoreError> {
        block_on_runtime(self.get_task_inner(shift_id, task_id))
    }

    fn save_task(&self, task: ShiftTask) -> Result<ShiftTask, StoreError> {
        block_on_runtime(self.save_task_inner(task))
    }
}

/// Postgres-backed append-only journal.
#[derive(Debug, Clone)]
pub struct PostgresEventJournal {
    pool: Arc<PgPool>,
}

impl PostgresEventJournal {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    #[instrument(skip(self, event), fields(shift_id = %event.shift_id, event_type = event.event_type()))]
    async fn append_inner(&self, event: ShiftEvent) -> Result<(), JournalError> {
        let payload = serde_json::to_value(&event.payload)
            .map_err(|e| JournalError::InvalidEvent(format!("payload encoding: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO shift_events (
                id, company_id, location_id, shift_id, employee_id,
                event_type, created_at, payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.company_id.as_uuid())
        .bind(event.location_id.as_uuid())
        .bind(event.shift_id.as_uuid())
        .bind(event.employee_id.as_uuid())
        .bind(event.event_type())
        .bind(event.created_at)
        .bind(payload)
        .execute(&*self.pool)
        .await
        .map_err(|e| JournalError::Unavailable(format!("append: {e}")))?;

        Ok(())
    }

    async fn read_for_shift_inner(&self, shift_id: ShiftId) -> Result<Vec<ShiftEvent>, JournalError> {
        let rows = sqlx::query(
            "SELECT * FROM shift_events WHERE shift_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(shift_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| JournalError::Unavailable(format!("read_for_shift: {e}")))?;

        rows.into_iter().map(decode_event_row).collect()
    }
}

impl EventJournal for PostgresEventJournal {
    fn append(&self, event: ShiftEvent) -> Result<(), JournalError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| JournalError::Unavailable(NO_RUNTIME.to_string()))?;
        handle.block_on(self.append_inner(event))
    }

    fn read_for_shift(&self, shift_id: ShiftId) -> Result<Vec<ShiftEvent>, JournalError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| JournalError::Unavailable(NO_RUNTIME.to_string()))?;
        handle.block_on(self.read_for_shift_inner(shift_id))
    }
}

const NO_RUNTIME: &str =
    "Postgres backends require an ambient tokio runtime; call from within one";

/// Bridge a synchronous trait method into the ambient tokio runtime.
fn block_on_runtime<F, T>(fut: F) -> Result<T, StoreError>
where
    F: core::future::Future<Output = Result<T, StoreError>>,
{
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|_| StoreError::Unavailable(NO_RUNTIME.to_string()))?;
    handle.block_on(fut)
}

fn encode_status(status: ShiftStatus) -> &'static str {
    match status {
        ShiftStatus::Active => "active",
        ShiftStatus::Closed => "closed",
    }
}

fn decode_status(raw: &str) -> Result<ShiftStatus, StoreError> {
    match raw {
        "active" => Ok(ShiftStatus::Active),
        "closed" => Ok(ShiftStatus::Closed),
        other => Err(StoreError::InvalidRecord(format!(
            "unknown shift status '{other}'"
        ))),
    }
}

fn decode_tender(raw: &str) -> Result<TenderType, StoreError> {
    match raw {
        "cash" => Ok(TenderType::Cash),
        "card" => Ok(TenderType::Card),
        "online" => Ok(TenderType::Online),
        other => Err(StoreError::InvalidRecord(format!(
            "unknown tender type '{other}'"
        ))),
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            if db_err.code().as_deref() == Some("23505") {
                // Unique violation: the active-shift index is the conflict
                // the services understand; anything else is a caller bug.
                if db_err.constraint() == Some(ACTIVE_SHIFT_INDEX) {
                    return StoreError::ActiveShiftExists;
                }
                return StoreError::InvalidRecord(msg);
            }
            StoreError::Unavailable(msg)
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

// SQLx row types

#[derive(Debug)]
struct ShiftRow {
    id: Uuid,
    employee_id: Uuid,
    employee_name: String,
    location_id: Uuid,
    company_id: Option<Uuid>,
    number: i64,
    status: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    revenue_cash: i64,
    revenue_card: i64,
    revenue_online: i64,
    check_count: i32,
    guest_count: i32,
    note: Option<String>,
    closing_answers: serde_json::Value,
}

impl<'r> FromRow<'r, PgRow> for ShiftRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ShiftRow {
            id: row.try_get("id")?,
            employee_id: row.try_get("employee_id")?,
            employee_name: row.try_get("employee_name")?,
            location_id: row.try_get("location_id")?,
            company_id: row.try_get("company_id")?,
            number: row.try_get("number")?,
            status: row.try_get("status")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
            revenue_cash: row.try_get("revenue_cash")?,
            revenue_card: row.try_get("revenue_card")?,
            revenue_online: row.try_get("revenue_online")?,
            check_count: row.try_get("check_count")?,
            guest_count: row.try_get("guest_count")?,
            note: row.try_get("note")?,
            closing_answers: row.try_get("closing_answers")?,
        })
    }
}

fn decode_shift_row(row: PgRow) -> Result<Shift, StoreError> {
    let raw = ShiftRow::from_row(&row)
        .map_err(|e| StoreError::InvalidRecord(format!("shift row: {e}")))?;

    let closing_answers: BTreeMap<String, String> = serde_json::from_value(raw.closing_answers)
        .map_err(|e| StoreError::InvalidRecord(format!("closing answers: {e}")))?;

    Ok(Shift {
        id: ShiftId::from_uuid(raw.id),
        employee_id: EmployeeId::from_uuid(raw.employee_id),
        employee_name: raw.employee_name,
        location_id: LocationId::from_uuid(raw.location_id),
        company_id: raw.company_id.map(crewshift_core::CompanyId::from_uuid),
        number: raw.number.max(0) as u64,
        status: decode_status(&raw.status)?,
        started_at: raw.started_at,
        ended_at: raw.ended_at,
        revenue_cash: raw.revenue_cash,
        revenue_card: raw.revenue_card,
        revenue_online: raw.revenue_online,
        check_count: raw.check_count.max(0) as u32,
        guest_count: raw.guest_count.max(0) as u32,
        note: raw.note,
        closing_answers,
    })
}

fn decode_order_row(row: PgRow) -> Result<Order, StoreError> {
    let tender: String = row
        .try_get("tender")
        .map_err(|e| StoreError::InvalidRecord(format!("order row: {e}")))?;

    let read = |field: &str| -> Result<Uuid, StoreError> {
        row.try_get(field)
            .map_err(|e| StoreError::InvalidRecord(format!("order row: {e}")))
    };

    Ok(Order {
        id: crewshift_core::OrderId::from_uuid(read("id")?),
        shift_id: ShiftId::from_uuid(read("shift_id")?),
        employee_id: EmployeeId::from_uuid(read("employee_id")?),
        tender: decode_tender(&tender)?,
        amount: row
            .try_get("amount")
            .map_err(|e| StoreError::InvalidRecord(format!("order row: {e}")))?,
        guest_count: row
            .try_get::<i32, _>("guest_count")
            .map_err(|e| StoreError::InvalidRecord(format!("order row: {e}")))?
            .max(0) as u32,
        created_at: row
            .try_get("created_at")
            .map_err(|e| StoreError::InvalidRecord(format!("order row: {e}")))?,
    })
}

fn decode_task_row(row: PgRow) -> Result<ShiftTask, StoreError> {
    let read_uuid = |field: &str| -> Result<Uuid, StoreError> {
        row.try_get(field)
            .map_err(|e| StoreError::InvalidRecord(format!("task row: {e}")))
    };

    Ok(ShiftTask {
        id: TaskId::from_uuid(read_uuid("id")?),
        shift_id: ShiftId::from_uuid(read_uuid("shift_id")?),
        employee_id: EmployeeId::from_uuid(read_uuid("employee_id")?),
        title: row
            .try_get("title")
            .map_err(|e| StoreError::InvalidRecord(format!("task row: {e}")))?,
        details: row
            .try_get("details")
            .map_err(|e| StoreError::InvalidRecord(format!("task row: {e}")))?,
        completed: row
            .try_get("completed")
            .map_err(|e| StoreError::InvalidRecord(format!("task row: {e}")))?,
        completed_at: row
            .try_get("completed_at")
            .map_err(|e| StoreError::InvalidRecord(format!("task row: {e}")))?,
    })
}

fn decode_event_row(row: PgRow) -> Result<ShiftEvent, JournalError> {
    let read_uuid = |field: &str| -> Result<Uuid, JournalError> {
        row.try_get(field)
            .map_err(|e| JournalError::InvalidEvent(format!("event row: {e}")))
    };

    let payload_raw: serde_json::Value = row
        .try_get("payload")
        .map_err(|e| JournalError::InvalidEvent(format!("event row: {e}")))?;
    let payload: ShiftEventPayload = serde_json::from_value(payload_raw)
        .map_err(|e| JournalError::InvalidEvent(format!("event payload: {e}")))?;

    Ok(ShiftEvent {
        id: crewshift_core::EventId::from_uuid(read_uuid("id")?),
        company_id: crewshift_core::CompanyId::from_uuid(read_uuid("company_id")?),
        location_id: LocationId::from_uuid(read_uuid("location_id")?),
        shift_id: ShiftId::from_uuid(read_uuid("shift_id")?),
        employee_id: EmployeeId::from_uuid(read_uuid("employee_id")?),
        created_at: row
            .try_get("created_at")
            .map_err(|e| JournalError::InvalidEvent(format!("event row: {e}")))?,
        payload,
    })
}
