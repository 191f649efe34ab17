//! Persistent store collaborators.
//!
//! The live engine only ever talks to the traits in [`service`]; the
//! in-memory backend serves tests and the dev server, the Postgres backend
//! serves deployments.

pub mod inmemory;
pub mod service;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use inmemory::InMemoryStore;
pub use service::{FamilyStore, GeofenceStore, HistoryStore, MembershipResolver};

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
