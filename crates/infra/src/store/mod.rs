//! Storage boundary.
//!
//! The traits here are the repository contract the services depend on,
//! without storage assumptions: the in-memory backends serve tests/dev,
//! the Postgres backends serve production.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryEventJournal, InMemoryStore};
pub use postgres::{PostgresEventJournal, PostgresStore};
pub use r#trait::{OrderLedger, ShiftStore, StoreError, TaskStore};
