//! Infrastructure layer: storage backends and the application services
//! that drive the shift lifecycle against them.

pub mod service;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use service::{CloseTarget, ServiceError, ShiftService, StartShift, TaskService};
pub use store::{
    InMemoryEventJournal, InMemoryStore, OrderLedger, PostgresEventJournal, PostgresStore,
    ShiftStore, StoreError, TaskStore,
};
