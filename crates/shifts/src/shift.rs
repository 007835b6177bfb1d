//! Shift entity and lifecycle transitions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crewshift_core::{
    CompanyId, DomainError, DomainResult, EmployeeId, Entity, LocationId, ShiftId,
};
use crewshift_orders::OrdersSummary;

use crate::closing::ClosingFields;

/// Shift lifecycle status. `Closed` is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Active,
    Closed,
}

/// One work session for one employee at one location.
///
/// Monetary fields are minor currency units. `number` is the human-readable
/// sequence number, assigned per location by the store on first insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub location_id: LocationId,
    pub company_id: Option<CompanyId>,
    pub number: u64,
    pub status: ShiftStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub revenue_cash: i64,
    pub revenue_card: i64,
    pub revenue_online: i64,
    pub check_count: u32,
    pub guest_count: u32,
    pub note: Option<String>,
    pub closing_answers: BTreeMap<String, String>,
}

impl Entity for Shift {
    type Id = ShiftId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Shift {
    /// Open a new shift in `Active` state with zeroed counters.
    ///
    /// The store assigns `number` on insert; until then it is 0.
    pub fn open(
        employee_id: EmployeeId,
        employee_name: impl Into<String>,
        location_id: LocationId,
        company_id: Option<CompanyId>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ShiftId::new(),
            employee_id,
            employee_name: employee_name.into(),
            location_id,
            company_id,
            number: 0,
            status: ShiftStatus::Active,
            started_at,
            ended_at: None,
            revenue_cash: 0,
            revenue_card: 0,
            revenue_online: 0,
            check_count: 0,
            guest_count: 0,
            note: None,
            closing_answers: BTreeMap::new(),
        }
    }

    /// Whether this shift is active.
    ///
    /// `status` and `ended_at` must agree: a record carrying `Active` with
    /// an end timestamp (or `Closed` without one) is treated as **not**
    /// active. Every store read routes through this predicate, so a
    /// corrupted record can never hold the active slot for its
    /// (employee, location) pair.
    pub fn is_active(&self) -> bool {
        self.status == ShiftStatus::Active && self.ended_at.is_none()
    }

    /// Legacy total handed back to callers on close: cash + card.
    /// Online tender is tracked on the shift but reconciled separately.
    pub fn total_revenue(&self) -> i64 {
        self.revenue_cash + self.revenue_card
    }

    /// Close the shift, freezing its financial fields.
    ///
    /// Explicit cash/card/guests in `fields` win over the ledger-derived
    /// `summary`; online revenue and the check count always come from the
    /// summary. `status` and `ended_at` are set together, never
    /// independently.
    pub fn close(
        mut self,
        ended_at: DateTime<Utc>,
        fields: &ClosingFields,
        summary: &OrdersSummary,
    ) -> DomainResult<Self> {
        if !self.is_active() {
            return Err(DomainError::invariant("shift is already closed"));
        }

        self.revenue_cash = fields.cash.unwrap_or(summary.cash);
        self.revenue_card = fields.card.unwrap_or(summary.card);
        self.revenue_online = summary.online;
        self.check_count = summary.check_count;
        self.guest_count = fields.guests.unwrap_or(summary.guest_count);

        if let Some(note) = &fields.note {
            self.note = Some(note.clone());
        }
        self.closing_answers
            .extend(fields.answers.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.status = ShiftStatus::Closed;
        self.ended_at = Some(ended_at);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn open_shift() -> Shift {
        Shift::open(
            EmployeeId::new(),
            "Dana",
            LocationId::new(),
            Some(CompanyId::new()),
            Utc::now(),
        )
    }

    fn summary(cash: i64, card: i64, online: i64, checks: u32, guests: u32) -> OrdersSummary {
        OrdersSummary {
            cash,
            card,
            online,
            check_count: checks,
            guest_count: guests,
        }
    }

    #[test]
    fn open_shift_is_active_with_zeroed_counters() {
        let shift = open_shift();
        assert!(shift.is_active());
        assert_eq!(shift.number, 0);
        assert_eq!(shift.total_revenue(), 0);
        assert_eq!(shift.ended_at, None);
    }

    #[test]
    fn close_derives_figures_from_the_summary_by_default() {
        let shift = open_shift();
        let closed = shift
            .close(
                Utc::now(),
                &ClosingFields::default(),
                &summary(12_500, 5_000, 700, 3, 7),
            )
            .unwrap();

        assert_eq!(closed.status, ShiftStatus::Closed);
        assert!(closed.ended_at.is_some());
        assert_eq!(closed.revenue_cash, 12_500);
        assert_eq!(closed.revenue_card, 5_000);
        assert_eq!(closed.revenue_online, 700);
        assert_eq!(closed.check_count, 3);
        assert_eq!(closed.guest_count, 7);
        assert_eq!(closed.total_revenue(), 17_500);
    }

    #[test]
    fn explicit_closing_fields_win_over_the_summary() {
        let fields = ClosingFields {
            cash: Some(500),
            card: Some(300),
            guests: Some(2),
            ..ClosingFields::default()
        };

        let closed = open_shift()
            .close(Utc::now(), &fields, &summary(12_500, 5_000, 700, 3, 7))
            .unwrap();

        assert_eq!(closed.revenue_cash, 500);
        assert_eq!(closed.revenue_card, 300);
        assert_eq!(closed.guest_count, 2);
        // Online and check count are never overridden.
        assert_eq!(closed.revenue_online, 700);
        assert_eq!(closed.check_count, 3);
    }

    #[test]
    fn closing_twice_violates_the_lifecycle() {
        let closed = open_shift()
            .close(Utc::now(), &ClosingFields::default(), &OrdersSummary::default())
            .unwrap();

        let err = closed
            .close(Utc::now(), &ClosingFields::default(), &OrdersSummary::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn close_merges_note_and_answers() {
        let mut fields = ClosingFields::default();
        fields.note = Some("Register drawer sticking".to_string());
        fields
            .answers
            .insert("fridge_temp".to_string(), "4C".to_string());

        let closed = open_shift()
            .close(Utc::now(), &fields, &OrdersSummary::default())
            .unwrap();

        assert_eq!(closed.note.as_deref(), Some("Register drawer sticking"));
        assert_eq!(closed.closing_answers["fridge_temp"], "4C");
    }

    proptest! {
        /// Status and end timestamp must agree for a shift to count as
        /// active; any disagreement reads as inactive.
        #[test]
        fn activity_requires_status_and_end_timestamp_to_agree(
            closed_status in any::<bool>(),
            has_end in any::<bool>(),
        ) {
            let mut shift = open_shift();
            shift.status = if closed_status { ShiftStatus::Closed } else { ShiftStatus::Active };
            shift.ended_at = has_end.then(Utc::now);

            prop_assert_eq!(shift.is_active(), !closed_status && !has_end);
        }
    }
}
