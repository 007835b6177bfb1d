//! Summary fold over a shift's order slice.

use serde::{Deserialize, Serialize};

use crewshift_core::TenderType;

use crate::order::Order;

/// Totals derived from a shift's orders.
///
/// Amounts are minor currency units, split by tender type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersSummary {
    pub cash: i64,
    pub card: i64,
    pub online: i64,
    /// Number of orders (checks).
    pub check_count: u32,
    /// Sum of guest counts across all orders.
    pub guest_count: u32,
}

impl OrdersSummary {
    pub fn total(&self) -> i64 {
        self.cash + self.card + self.online
    }
}

/// Fold a slice of orders into per-tender totals and counts.
///
/// The fold is commutative and associative over addition: iteration order
/// never affects the result, and the empty slice yields the zero summary.
pub fn summarize_orders(orders: &[Order]) -> OrdersSummary {
    orders.iter().fold(OrdersSummary::default(), |mut acc, order| {
        match order.tender {
            TenderType::Cash => acc.cash += order.amount,
            TenderType::Card => acc.card += order.amount,
            TenderType::Online => acc.online += order.amount,
        }
        acc.check_count += 1;
        acc.guest_count += order.guest_count;
        acc
    })
}
