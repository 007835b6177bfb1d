//! Tender types: how an order was paid.
//!
//! Monetary amounts across the workspace are carried in minor currency
//! units (e.g. cents) as `i64`, never floats.

use serde::{Deserialize, Serialize};

/// Payment method of a point-of-sale order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenderType {
    Cash,
    Card,
    Online,
}

impl TenderType {
    /// Stable wire name, matching the order ledger's tagging.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenderType::Cash => "cash",
            TenderType::Card => "card",
            TenderType::Online => "online",
        }
    }
}

impl core::fmt::Display for TenderType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
