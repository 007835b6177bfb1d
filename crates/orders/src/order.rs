//! Point-of-sale order record (read-only here).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crewshift_core::{EmployeeId, OrderId, ShiftId, TenderType};

/// A single point-of-sale transaction tagged with the shift it belongs to.
///
/// `amount` is minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub shift_id: ShiftId,
    pub employee_id: EmployeeId,
    pub tender: TenderType,
    pub amount: i64,
    pub guest_count: u32,
    pub created_at: DateTime<Utc>,
}
